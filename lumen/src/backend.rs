//! Backend interfacing.
//!
//! Almost everything declared in this module and its submodules is `unsafe`. An end-user is not
//! supposed to implement any of this. Library authors might use some traits from here, required
//! by generic code, but no one but backend authors should implement any of those traits.
//!
//! A backend is a type that speaks to a driver on behalf of the core crate. It is not supposed to
//! keep track of the state the core crate manages (link state, bound flags, uniform tables); it
//! only forwards calls and reports what the driver answers.

pub mod shader;

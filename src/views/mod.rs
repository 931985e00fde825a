//! View-models behind the screens.
//!
//! Each view fetches what it needs through a [`crate::api::Gateway`], applies
//! the caller's role policy and keeps the derived state the screen renders.
//! Views never patch their rows locally: every successful mutation is
//! followed by a fresh fetch.

pub mod appointments;
pub mod clinics;
pub mod dashboard;
pub mod directory;
pub mod users;

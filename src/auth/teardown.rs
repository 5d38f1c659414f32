//! Collaborator seams invoked during session teardown.
//!
//! Both live outside this crate: a persisted "stay signed in" flag that the
//! surrounding application reads on cold start, and whatever navigation takes
//! the user back to the sign-in entry point. Teardown only calls them; it
//! never inspects the flag to change its own behavior.

/// Persisted "stay signed in" preference, stored by the host application.
pub trait StaySignedIn: Send + Sync {
    fn clear(&self);
}

/// Takes the user to the sign-in entry point after teardown.
pub trait SignInNavigator: Send + Sync {
    fn to_sign_in(&self);
}

//! # Response validation.
//!
//! A validator is a synchronous predicate applied to every response that
//! arrives before its deadline. It runs on the success path of each attempt,
//! so it should be cheap and side-effect free.
//!
//! Any `Fn(&R) -> bool + Send + Sync` is a validator.

/// Synchronous predicate deciding whether a response is acceptable.
pub trait Validate<R>: Send + Sync {
    /// Returns `true` if `response` settles the invocation successfully.
    fn validate(&self, response: &R) -> bool;
}

impl<R, F> Validate<R> for F
where
    F: Fn(&R) -> bool + Send + Sync,
{
    fn validate(&self, response: &R) -> bool {
        self(response)
    }
}

/// Validator accepting every response, see [`accept_all`].
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl<R> Validate<R> for AcceptAll {
    fn validate(&self, _response: &R) -> bool {
        true
    }
}

/// Returns a validator that accepts every response.
pub fn accept_all() -> AcceptAll {
    AcceptAll
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closures_are_validators() {
        let even = |n: &u32| n % 2 == 0;
        assert!(even.validate(&4));
        assert!(!even.validate(&3));
        assert!(Validate::<String>::validate(&accept_all(), &String::new()));
    }
}

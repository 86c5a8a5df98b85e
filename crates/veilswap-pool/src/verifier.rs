//! proof oracle
//!
//! the pool never looks inside a proof. it hands the bytes and the
//! public inputs to a [`ProofVerifier`] and trusts the boolean.

use veilswap_merkle::FieldElement;

pub trait ProofVerifier: Send + Sync {
    fn verify(&self, proof: &[u8], public_inputs: &[FieldElement]) -> bool;
}

/// accepts every proof; for tests and local simulations only
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ProofVerifier for AcceptAll {
    fn verify(&self, _proof: &[u8], _public_inputs: &[FieldElement]) -> bool {
        true
    }
}

/// adapt a closure into a verifier
pub struct FnVerifier<F>(pub F);

impl<F> ProofVerifier for FnVerifier<F>
where
    F: Fn(&[u8], &[FieldElement]) -> bool + Send + Sync,
{
    fn verify(&self, proof: &[u8], public_inputs: &[FieldElement]) -> bool {
        (self.0)(proof, public_inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_verifier() {
        let verifier = FnVerifier(|proof: &[u8], inputs: &[FieldElement]| {
            proof == b"ok" && inputs.len() == 5
        });
        let inputs = [FieldElement::ZERO; 5];
        assert!(verifier.verify(b"ok", &inputs));
        assert!(!verifier.verify(b"no", &inputs));
        assert!(!verifier.verify(b"ok", &inputs[..4]));
        assert!(AcceptAll.verify(&[], &[]));
    }
}

use crate::error::{PeerPayError, Result};

/// Parse a payment datagram: the whole payload is a signed decimal i64.
/// No trimming, so a trailing newline makes the payment invalid.
pub fn parse_payment(payload: &[u8]) -> Result<i64> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| PeerPayError::InvalidPayment(format!("not ASCII: {e}")))?;
    text.parse::<i64>()
        .map_err(|e| PeerPayError::InvalidPayment(format!("{text:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signed_amounts() {
        assert_eq!(parse_payment(b"10").unwrap(), 10);
        assert_eq!(parse_payment(b"-7").unwrap(), -7);
        assert_eq!(parse_payment(b"+3").unwrap(), 3);
        assert_eq!(parse_payment(b"9223372036854775807").unwrap(), i64::MAX);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let payloads: [&[u8]; 6] = [b"abc", b"", b"10\n", b" 5", b"1.5", b"9223372036854775808"];
        for payload in payloads {
            assert!(
                matches!(parse_payment(payload), Err(PeerPayError::InvalidPayment(_))),
                "{payload:?} should be rejected"
            );
        }
    }
}

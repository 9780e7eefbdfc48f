use crate::protocol::transcript::Tag;
use subtle::ConstantTimeEq;

/// Checks a received Finished value against the tag computed locally.
///
/// The comparison runs in constant time for equal-length inputs; a length
/// mismatch is rejected outright.
///
/// 将收到的 Finished 值与本地计算的标签进行比较。
///
/// 对等长输入以常量时间比较；长度不一致时直接拒绝。
pub fn mac_verify(expected: &Tag, received: &Tag) -> bool {
    let (expected, received) = (expected.as_bytes(), received.as_bytes());
    expected.len() == received.len() && bool::from(expected.ct_eq(received))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_equal_tags() {
        let tag = Tag::from_bytes(vec![7; 32]);
        assert!(mac_verify(&tag, &tag.clone()));
    }

    #[test]
    fn rejects_single_bit_flip() {
        let tag = Tag::from_bytes(vec![7; 32]);
        let mut flipped = tag.as_bytes().to_vec();
        flipped[31] ^= 1;
        assert!(!mac_verify(&tag, &Tag::from_bytes(flipped)));
    }

    #[test]
    fn rejects_truncated_tag() {
        let tag = Tag::from_bytes(vec![7; 32]);
        assert!(!mac_verify(&tag, &Tag::from_bytes(vec![7; 31])));
    }
}

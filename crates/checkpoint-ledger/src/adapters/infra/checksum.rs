use crate::ports::outbound::ChecksumProvider;

/// CRC32 (IEEE) via crc32fast.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultChecksumProvider;

impl ChecksumProvider for DefaultChecksumProvider {
    fn compute_crc32(&self, data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_provider() {
        let provider = DefaultChecksumProvider;

        let data = b"hello world";
        let checksum = provider.compute_crc32(data);

        assert!(provider.verify_crc32(data, checksum));
        assert!(!provider.verify_crc32(data, checksum.wrapping_add(1)));
    }
}

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::errors::SerializationError;
use crate::ports::outbound::RecordSerializer;

/// Default record serializer using bincode.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeRecordSerializer;

impl RecordSerializer for BincodeRecordSerializer {
    fn serialize<T: Serialize>(&self, record: &T) -> Result<Vec<u8>, SerializationError> {
        bincode::serialize(record).map_err(|e| SerializationError {
            message: e.to_string(),
        })
    }

    fn deserialize<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, SerializationError> {
        bincode::deserialize(data).map_err(|e| SerializationError {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ProcessorCheckpoint;

    #[test]
    fn test_truncated_record_rejected() {
        let serializer = BincodeRecordSerializer;
        let row = ProcessorCheckpoint {
            processor_name: "user_txn".into(),
            last_success_version: 100,
            last_updated_at: 1_700_000_000,
            last_transaction_timestamp: Some(1_699_999_999),
        };

        let bytes = serializer.serialize(&row).unwrap();
        let result: Result<ProcessorCheckpoint, _> = serializer.deserialize(&bytes[..bytes.len() / 2]);
        assert!(result.is_err());
    }
}

use crate::domain::{Hash, KeyId, KvRecord};

pub const SOURCE: KeyId = KeyId([0xAA; 20]);
pub const DESTINATION: KeyId = KeyId([0xBB; 20]);

pub fn txid(n: u8) -> Hash {
    let mut h = [0u8; 32];
    h[0] = n;
    h[31] = 0x7f;
    h
}

pub fn make_record(tx: u8, key: &str, value: &str) -> KvRecord {
    make_record_with(tx, SOURCE, DESTINATION, key, value)
}

pub fn make_record_with(
    tx: u8,
    source: KeyId,
    destination: KeyId,
    key: &str,
    value: &str,
) -> KvRecord {
    KvRecord::new(txid(tx), source, destination, key, value)
}

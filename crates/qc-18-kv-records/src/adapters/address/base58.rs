use crate::domain::{AddressError, ChainNetwork, KeyId};
use crate::ports::outbound::AddressDecoder;

/// Decodes transparent pay-to-pubkey-hash addresses.
///
/// Layout after base58check decoding: 2-byte network prefix followed by the
/// 20-byte key identity. Script addresses and other networks' addresses are
/// rejected by prefix.
#[derive(Debug, Clone, Copy)]
pub struct Base58AddressDecoder {
    pubkey_prefix: [u8; 2],
}

impl Base58AddressDecoder {
    pub fn new(pubkey_prefix: [u8; 2]) -> Self {
        Self { pubkey_prefix }
    }

    pub fn for_network(network: ChainNetwork) -> Self {
        Self::new(network.pubkey_address_prefix())
    }

    /// Encode a key identity as an address of this decoder's network.
    pub fn encode(&self, key_id: &KeyId) -> String {
        let mut payload = Vec::with_capacity(2 + KeyId::LEN);
        payload.extend_from_slice(&self.pubkey_prefix);
        payload.extend_from_slice(key_id.as_bytes());
        bs58::encode(payload).with_check().into_string()
    }
}

impl AddressDecoder for Base58AddressDecoder {
    fn decode(&self, address: &str) -> Result<KeyId, AddressError> {
        let payload = bs58::decode(address.trim())
            .with_check(None)
            .into_vec()
            .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;

        if payload.len() < 2 || payload[..2] != self.pubkey_prefix {
            return Err(AddressError::WrongPrefix {
                expected: self.pubkey_prefix,
                found: payload.iter().take(2).copied().collect(),
            });
        }

        let body = &payload[2..];
        let bytes: [u8; 20] = body
            .try_into()
            .map_err(|_| AddressError::WrongLength(body.len()))?;
        Ok(KeyId(bytes))
    }
}

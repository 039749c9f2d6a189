use super::NodeStorage;
use chainwire_types::{ChainwireError, ChainwireResult};
use libp2p::identity::Keypair;
use tracing::{debug, info};

const KEYPAIR_KEY: &[u8] = b"keypair";

impl NodeStorage {
    pub fn store_keypair(&self, keypair: &Keypair) -> ChainwireResult<()> {
        let encoded = keypair
            .to_protobuf_encoding()
            .map_err(|e| ChainwireError::Storage(format!("Failed to encode keypair: {}", e)))?;

        self.identity.insert(KEYPAIR_KEY, encoded.as_slice()).map_err(|e| {
            self.metrics.record_error();
            ChainwireError::Storage(format!("Failed to store keypair: {}", e))
        })?;
        self.metrics.record_write(encoded.len());
        self.flush()?;

        debug!("Stored node keypair");
        Ok(())
    }

    pub fn load_keypair(&self) -> ChainwireResult<Option<Keypair>> {
        let value = self
            .identity
            .get(KEYPAIR_KEY)
            .map_err(|e| ChainwireError::Storage(format!("Failed to load keypair: {}", e)))?;
        self.metrics.record_read(value.as_ref().map(|v| v.len()));

        match value {
            Some(bytes) => Keypair::from_protobuf_encoding(&bytes)
                .map(Some)
                .map_err(|e| ChainwireError::Storage(format!("Corrupt keypair: {}", e))),
            None => Ok(None),
        }
    }

    /// Returns the persisted keypair, generating and storing an ed25519 one on
    /// first use.
    pub fn load_or_create_keypair(&self) -> ChainwireResult<Keypair> {
        if let Some(keypair) = self.load_keypair()? {
            return Ok(keypair);
        }

        let keypair = Keypair::generate_ed25519();
        self.store_keypair(&keypair)?;
        info!("Generated new node identity {}", keypair.public().to_peer_id());
        Ok(keypair)
    }
}

use ed25519_dalek::SigningKey;
use solana_pubkey::Pubkey;
use spectre_client::{AuditLogCipher, Lease, RecordStore, TransitionKind};
use utils::MemorySink;

pub struct Helpers;

impl Helpers {
    pub fn hash_from_hex(hex_str: &str) -> [u8; 32] {
        hex::decode(hex_str)
            .expect("Invalid hex")
            .try_into()
            .expect("Hash must be 32 bytes")
    }

    /// Opens every entry in the sink with the owner's key.
    pub fn decrypt_entries(sink: &MemorySink, owner_key: &SigningKey) -> Vec<String> {
        sink.entries()
            .iter()
            .map(|(_, envelope)| {
                let plaintext =
                    AuditLogCipher::decrypt(owner_key, envelope).expect("Failed to decrypt audit entry");
                String::from_utf8(plaintext).expect("Audit entry is not UTF-8")
            })
            .collect()
    }

    /// Leaves an already expired lease on the owner's row, as a crashed
    /// holder would.
    pub fn plant_stale_lease(store: &dyn RecordStore, owner: &Pubkey, kind: TransitionKind) -> Lease {
        let mut lease = Lease::new(kind, Pubkey::new_unique(), 0);
        lease.acquired_at_ms -= 10_000;
        lease.expires_at_ms -= 10_000;
        store
            .try_acquire(owner, lease.clone(), lease.acquired_at_ms)
            .expect("Failed to plant stale lease");
        lease
    }
}

//! Filesystem artifact host: the reference `Backend` behind the artifact
//! distributor. Writes/reads opaque byte blobs under a base directory;
//! swappable for S3/GCS in production.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use router::{Backend, Router};

/// One host storing artifact blobs as files under `base_dir`.
pub struct ArtifactHost {
    id: String,
    base_dir: PathBuf,
}

impl ArtifactHost {
    pub fn new(id: impl Into<String>, base_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { id: id.into(), base_dir })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Path an artifact key is stored under. `:` is sanitized to `_` for
    /// filesystem safety; the ring itself never sees the sanitized form.
    pub fn path_for(&self, artifact_key: &str) -> PathBuf {
        let safe = artifact_key.replace(':', "_");
        self.base_dir.join(format!("{safe}.bin"))
    }

    pub fn has(&self, artifact_key: &str) -> bool {
        self.path_for(artifact_key).exists()
    }
}

impl Backend for ArtifactHost {
    type Value = Vec<u8>;
    type PutOpts = ();
    type Error = std::io::Error;

    fn get(&self, key: &str) -> std::io::Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if !path.exists() {
            tracing::debug!(host_id = %self.id, key, "artifact missing");
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    fn put(&self, key: &str, value: Vec<u8>, _opts: ()) -> std::io::Result<()> {
        let bytes = value.len();
        fs::write(self.path_for(key), value)?;
        tracing::debug!(host_id = %self.id, key, bytes, "artifact written");
        Ok(())
    }
}

/// Convenience wrapper over [`Router`] exposing the artifact-specific
/// read/write shape.
pub struct ArtifactDistributor {
    router: Router<ArtifactHost>,
}

impl ArtifactDistributor {
    /// `multiprobe = 3`, matching the reference `ArtifactDistributor`.
    pub fn new(ring: Arc<corelib::Ring>, replication: usize) -> Self {
        Self {
            router: Router::new(ring, replication, 3),
        }
    }

    pub fn router(&self) -> &Router<ArtifactHost> {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router<ArtifactHost> {
        &mut self.router
    }

    pub fn attach(&mut self, id: impl Into<String>, host: ArtifactHost, weight: u32) -> corelib::Result<()> {
        self.router.attach(id, host, weight)
    }

    pub fn detach(&mut self, id: &str) {
        self.router.detach(id);
    }

    /// Write `blob` to every host in `key`'s current placement. The
    /// reference `ArtifactRebalancer` calls `dist.distribute(key, blob)`
    /// without the reference `ArtifactDistributor` ever defining it; this is
    /// the resolution of that open question, symmetric to
    /// `CacheRouter::set`.
    pub fn distribute(&self, key: &str, blob: &[u8]) -> std::io::Result<()> {
        let mut hosts = 0;
        for host in self.router.placement(key) {
            host.put(key, blob.to_vec(), ())?;
            hosts += 1;
        }
        tracing::debug!(key, hosts, "artifact distributed to placement");
        Ok(())
    }

    /// First non-empty blob across `key`'s current placement.
    pub fn fetch(&self, key: &str) -> std::io::Result<Option<Vec<u8>>> {
        for host in self.router.placement(key) {
            if let Some(blob) = host.get(key)? {
                return Ok(Some(blob));
            }
        }
        tracing::debug!(key, "artifact fetch missed on every replica");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_colons_in_path() {
        let dir = tempfile::tempdir().unwrap();
        let host = ArtifactHost::new("host-a", dir.path()).unwrap();
        let path = host.path_for("artifact:lora:en:1");
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), "artifact_lora_en_1.bin");
    }

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let host = ArtifactHost::new("host-a", dir.path()).unwrap();
        host.put("blob-1", b"hello".to_vec(), ()).unwrap();
        assert_eq!(host.get("blob-1").unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn missing_key_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let host = ArtifactHost::new("host-a", dir.path()).unwrap();
        assert_eq!(host.get("never-written").unwrap(), None);
    }

    #[test]
    fn distribute_fans_out_to_current_placement() {
        let dir = tempfile::tempdir().unwrap();
        let ring = Arc::new(corelib::Ring::with_virtual_nodes_per_weight(32, 11));
        let mut dist = ArtifactDistributor::new(ring, 2);
        for id in ["host-a", "host-b", "host-c"] {
            let host = ArtifactHost::new(id, dir.path().join(id)).unwrap();
            dist.attach(id, host, 1).unwrap();
        }

        dist.distribute("artifact:lora:en:1", b"weights").unwrap();
        assert_eq!(dist.fetch("artifact:lora:en:1").unwrap(), Some(b"weights".to_vec()));
    }
}

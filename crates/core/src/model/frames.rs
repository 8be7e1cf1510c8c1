use indexmap::IndexMap;

/// One phase-space render at a discrete z sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// z position in meters, parsed from the response's stringified key.
    pub z: f64,
    /// Opaque image payload (base64 png from the service).
    pub image: String,
}

/// The per-z image frames of one simulate response, sorted by z.
///
/// Replaced wholesale on every successful response, never merged with a
/// previous map. Lookup is nearest-key because the service stringifies float
/// keys and bit-exact matches against the chart's z values are not
/// guaranteed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStore {
    frames: Vec<Frame>,
}

impl FrameStore {
    /// Build a store from the response's `images` map.
    ///
    /// Keys that don't parse as finite numbers are dropped; each drop is
    /// reported as a warning rather than failing the whole response.
    pub fn from_images(images: &IndexMap<String, String>) -> (Self, Vec<String>) {
        let mut frames = Vec::with_capacity(images.len());
        let mut warnings = Vec::new();
        for (key, image) in images {
            match key.trim().parse::<f64>() {
                Ok(z) if z.is_finite() => frames.push(Frame {
                    z,
                    image: image.clone(),
                }),
                _ => warnings.push(format!("dropped image frame with non-numeric key `{key}`")),
            }
        }
        frames.sort_by(|a, b| a.z.total_cmp(&b.z));
        (Self { frames }, warnings)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// The grid origin, i.e. the smallest sampled z.
    pub fn origin(&self) -> Option<f64> {
        self.frames.first().map(|f| f.z)
    }

    /// The frame whose z is closest to the requested position, or `None`
    /// when the store is empty.
    pub fn nearest(&self, z: f64) -> Option<&Frame> {
        if self.frames.is_empty() {
            return None;
        }
        let upper = self.frames.partition_point(|f| f.z < z);
        let candidates = [upper.checked_sub(1), Some(upper)];
        candidates
            .into_iter()
            .flatten()
            .filter_map(|i| self.frames.get(i))
            .min_by(|a, b| (a.z - z).abs().total_cmp(&(b.z - z).abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(keys: &[&str]) -> (FrameStore, Vec<String>) {
        let images: IndexMap<String, String> = keys
            .iter()
            .map(|k| ((*k).to_owned(), format!("img-{k}")))
            .collect();
        FrameStore::from_images(&images)
    }

    #[test]
    fn empty_store_has_no_frame() {
        let store = FrameStore::default();
        assert!(store.nearest(0.0).is_none());
        assert!(store.origin().is_none());
    }

    #[test]
    fn exact_key_match_returns_its_payload() {
        let (store, warnings) = store(&["0.0", "0.05", "0.1"]);
        assert!(warnings.is_empty());
        assert_eq!(store.nearest(0.05).unwrap().image, "img-0.05");
    }

    #[test]
    fn lookup_snaps_to_nearest_key() {
        let (store, _) = store(&["0.0", "0.05", "0.1"]);
        assert_eq!(store.nearest(0.051).unwrap().z, 0.05);
        assert_eq!(store.nearest(0.09).unwrap().z, 0.1);
        assert_eq!(store.nearest(-3.0).unwrap().z, 0.0);
        assert_eq!(store.nearest(99.0).unwrap().z, 0.1);
    }

    #[test]
    fn unsorted_and_bad_keys_are_handled() {
        let (store, warnings) = store(&["0.1", "oops", "0.0"]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.origin(), Some(0.0));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("oops"));
    }
}

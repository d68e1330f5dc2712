use std::fmt;

/// Two-part key into the external content store: (collection, name).
///
/// The core only carries keys around; loading and lifetime of the images
/// behind them belong to whoever resolves the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub collection: String,
    pub name: String,
}

impl AssetKey {
    pub fn new(collection: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.name)
    }
}

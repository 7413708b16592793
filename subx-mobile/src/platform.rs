//! Host platform identity.

use std::fmt;

use subx_lib::StoreName;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Platform of the compile target. Anything that is not iOS reports Android.
    pub fn current() -> Self {
        if cfg!(target_os = "ios") {
            Self::Ios
        } else {
            Self::Android
        }
    }

    /// Store the platform's receipts belong to.
    pub fn store_name(&self) -> StoreName {
        match self {
            Self::Ios => StoreName::AppStore,
            Self::Android => StoreName::PlayStore,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ios => write!(f, "ios"),
            Self::Android => write!(f, "android"),
        }
    }
}

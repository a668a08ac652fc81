use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, HomeError>;

/// Errors produced while preparing an application home directory.
#[derive(Debug, thiserror::Error)]
pub enum HomeError {
    #[error("failed to create {app} home directory {path}")]
    CreateHome {
        app: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to get home preparation lock {path}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk embedded assets at {path}")]
    AssetWalk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("embedded asset {path} is invalid, not a regular file")]
    NotRegularFile { path: PathBuf },

    #[error("embedded asset path {path} must be relative and stay inside the asset tree")]
    InvalidAssetPath { path: PathBuf },

    #[error("failed to extract asset to {path}")]
    Extract {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to restore assets into {path}")]
    Restore {
        path: PathBuf,
        #[source]
        source: Box<HomeError>,
    },

    #[error("failed to read assets directory {path}")]
    ReadAssets {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path {path} is not under assets root {root}")]
    PathNotUnderAssetsRoot { path: PathBuf, root: PathBuf },

    #[error("failed to clean up old assets {path}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write home version {path}")]
    WriteStamp {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read configuration {path}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration {path}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn restore_error_keeps_the_chain() {
        let err = HomeError::Restore {
            path: PathBuf::from("/home/.config/app/assets/1.0.0"),
            source: Box::new(HomeError::Extract {
                path: PathBuf::from("/home/.config/app/assets/1.0.0/a.txt"),
                source: std::io::Error::from(std::io::ErrorKind::AlreadyExists),
            }),
        };

        assert!(err.to_string().contains("assets/1.0.0"));
        let extract = err.source().expect("restore wraps extract error");
        assert!(extract.to_string().contains("a.txt"));
        let io = extract.source().expect("extract wraps io error");
        assert!(io.downcast_ref::<std::io::Error>().is_some());
    }
}

//! A callback-style HTTP getter.

use tracing::debug;
use understudy_core::{Callback, DoubleError, Seam, TargetId};

/// Arguments of a `get`: the url and the callback receiving the response parts.
pub type GetArgs = (String, Callback<Vec<String>>);

/// Response parts delivered when no network is available.
pub const OFFLINE: &str = "503 Service Unavailable";

#[derive(Debug, Clone)]
pub struct HttpClient {
    get: Seam<GetArgs, ()>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::offline()
    }
}

impl HttpClient {
    /// A client without a transport. Every request is answered with [`OFFLINE`].
    pub fn offline() -> Self {
        Self {
            get: Seam::new(TargetId::new(), "get", |(url, callback): GetArgs| {
                debug!(url = %url, "No transport, answering offline");
                callback.invoke(vec![OFFLINE.to_string()]);
            }),
        }
    }

    pub fn get_seam(&self) -> &Seam<GetArgs, ()> {
        &self.get
    }

    /// Requests `url` and hands the response parts to `callback`.
    pub fn get(&self, url: &str, callback: Callback<Vec<String>>) -> Result<(), DoubleError> {
        self.get.call((url.to_string(), callback))?;
        Ok(())
    }
}

/// Where the callback sits in a `get` call.
pub fn callback_of(args: &GetArgs) -> Option<Callback<Vec<String>>> {
    Some(args.1.clone())
}

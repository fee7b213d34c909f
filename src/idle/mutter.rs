//! GNOME Mutter idle source over the session bus.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};
use zbus::{Connection, Proxy};

use super::{IdleError, IdleSource};

const BUS_NAME: &str = "org.gnome.Mutter.IdleMonitor";
const OBJECT_PATH: &str = "/org/gnome/Mutter/IdleMonitor/Core";
const INTERFACE: &str = "org.gnome.Mutter.IdleMonitor";

/// Polls `GetIdletime` on Mutter's core idle monitor.
pub struct MutterSource {
    proxy: Proxy<'static>,
}

impl MutterSource {
    pub async fn connect() -> Result<Self, IdleError> {
        let connection = Connection::session().await?;
        let proxy = Proxy::new(&connection, BUS_NAME, OBJECT_PATH, INTERFACE).await?;
        debug!("Connected to {} on the session bus", BUS_NAME);

        Ok(Self { proxy })
    }
}

#[async_trait]
impl IdleSource for MutterSource {
    async fn query_idle(&mut self) -> Result<Duration, IdleError> {
        let idle_ms: u64 = self.proxy.call("GetIdletime", &()).await?;
        trace!("Mutter idle: {} ms", idle_ms);
        Ok(Duration::from_millis(idle_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires a GNOME session bus
    async fn test_query_idle_live() {
        let mut source = MutterSource::connect().await.unwrap();
        let idle = source.query_idle().await.unwrap();
        println!("Idle: {idle:?}");
    }
}

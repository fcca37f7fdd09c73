//! Wi-Fi station association.

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::WifiCredentials;

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// The interface driver reported an error.
    Interface(String),
    /// No address was obtained within the configured limit.
    Timeout(Duration),
}

impl NetworkError {
    pub fn interface(err: impl fmt::Display) -> Self {
        Self::Interface(err.to_string())
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interface(err) => write!(f, "interface error: {err}"),
            Self::Timeout(limit) => write!(f, "no address after {limit:?}"),
        }
    }
}

impl std::error::Error for NetworkError {}

/// A station-mode network interface.
pub trait StationInterface {
    /// Power up the interface.
    fn activate(&mut self) -> Result<(), NetworkError>;

    /// Start associating; returns without waiting for the result.
    fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError>;

    /// Associated and holding an address.
    fn is_connected(&self) -> Result<bool, NetworkError>;

    /// Human-readable interface configuration (address, mask, gateway, DNS).
    fn ip_info(&self) -> Result<String, NetworkError>;

    fn disconnect(&mut self) -> Result<(), NetworkError>;

    fn deactivate(&mut self) -> Result<(), NetworkError>;
}

/// How [`connect`] waits for the interface to come up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaitPolicy {
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: None,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// An associated interface. Dropping it leaves the link up; call
/// [`NetworkHandle::disconnect`] to tear it down.
pub struct NetworkHandle<W: StationInterface> {
    iface: W,
}

impl<W: StationInterface> NetworkHandle<W> {
    pub fn interface(&self) -> &W {
        &self.iface
    }

    pub fn ip_info(&self) -> Result<String, NetworkError> {
        self.iface.ip_info()
    }

    /// Disconnect and power down. Teardown problems are logged, not returned:
    /// there is nothing left to do with the interface either way.
    pub fn disconnect(mut self) -> W {
        if let Err(e) = self.iface.disconnect() {
            log::warn!("Wi-Fi disconnect failed: {}", e);
        }
        if let Err(e) = self.iface.deactivate() {
            log::warn!("Wi-Fi deactivate failed: {}", e);
        }
        log::info!("Wi-Fi disconnected");

        self.iface
    }
}

/// Activate `iface`, associate with the configured network and block until
/// it reports an address.
pub fn connect<W: StationInterface>(
    mut iface: W,
    credentials: &WifiCredentials,
    policy: WaitPolicy,
) -> Result<NetworkHandle<W>, NetworkError> {
    iface.activate()?;
    iface.begin_connect(&credentials.ssid, &credentials.password)?;
    log::info!("Connecting to Wi-Fi network {}", credentials.ssid);

    let started = Instant::now();
    while !iface.is_connected()? {
        if let Some(limit) = policy.timeout {
            if started.elapsed() >= limit {
                log::error!("Wi-Fi association timed out after {:?}", limit);
                if let Err(e) = iface.deactivate() {
                    log::warn!("Wi-Fi deactivate failed: {}", e);
                }
                return Err(NetworkError::Timeout(limit));
            }
        }

        if policy.poll_interval.is_zero() {
            std::hint::spin_loop();
        } else {
            std::thread::sleep(policy.poll_interval);
        }
    }

    log::info!("Successful Wi-Fi connection");
    match iface.ip_info() {
        Ok(info) => log::info!("{}", info),
        Err(e) => log::warn!("Unable to query interface config: {}", e),
    }

    Ok(NetworkHandle { iface })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    /// Interface that comes up after a number of polls (never if `None`).
    #[derive(Default)]
    pub(crate) struct FakeStation {
        pub polls_until_up: Option<u32>,
        pub polls: Cell<u32>,
        pub active: bool,
        pub associated_with: Option<(String, String)>,
        pub disconnects: u32,
    }

    impl FakeStation {
        pub fn up_after(polls: u32) -> Self {
            Self {
                polls_until_up: Some(polls),
                ..Default::default()
            }
        }
    }

    impl StationInterface for FakeStation {
        fn activate(&mut self) -> Result<(), NetworkError> {
            self.active = true;
            Ok(())
        }

        fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
            if !self.active {
                return Err(NetworkError::interface("inactive"));
            }
            self.associated_with = Some((ssid.into(), password.into()));
            Ok(())
        }

        fn is_connected(&self) -> Result<bool, NetworkError> {
            let polls = self.polls.get() + 1;
            self.polls.set(polls);
            Ok(self.polls_until_up.is_some_and(|n| polls > n))
        }

        fn ip_info(&self) -> Result<String, NetworkError> {
            Ok("ip: 192.168.1.20, mask: 255.255.255.0".into())
        }

        fn disconnect(&mut self) -> Result<(), NetworkError> {
            self.associated_with = None;
            self.disconnects += 1;
            Ok(())
        }

        fn deactivate(&mut self) -> Result<(), NetworkError> {
            self.active = false;
            Ok(())
        }
    }

    fn credentials() -> WifiCredentials {
        WifiCredentials {
            ssid: "MyNet".into(),
            password: "secret".into(),
        }
    }

    fn spinning() -> WaitPolicy {
        WaitPolicy {
            timeout: None,
            poll_interval: Duration::ZERO,
        }
    }

    #[test]
    fn waits_until_the_interface_is_up() {
        let handle = connect(FakeStation::up_after(25), &credentials(), spinning()).unwrap();

        let station = handle.interface();
        assert!(station.active);
        assert_eq!(station.polls.get(), 26);
        assert_eq!(
            station.associated_with,
            Some(("MyNet".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn disconnect_tears_everything_down() {
        let handle = connect(FakeStation::up_after(0), &credentials(), spinning()).unwrap();
        let station = handle.disconnect();

        assert!(!station.active);
        assert_eq!(station.associated_with, None);
        assert_eq!(station.disconnects, 1);
    }

    #[test]
    fn optional_timeout_gives_up() {
        let policy = WaitPolicy {
            timeout: Some(Duration::from_millis(20)),
            poll_interval: Duration::from_millis(1),
        };

        let result = connect(FakeStation::default(), &credentials(), policy);
        assert!(matches!(result, Err(NetworkError::Timeout(_))));
    }
}

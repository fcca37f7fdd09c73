use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::info;

use psychro_common::network::{NetworkError, StationInterface};

type Wifi = BlockingWifi<EspWifi<'static>>;

/// The ESP32 station interface.
pub struct EspStation {
    wifi: Wifi,
}

impl EspStation {
    pub fn new(wifi: Wifi) -> Self {
        Self { wifi }
    }
}

impl StationInterface for EspStation {
    fn activate(&mut self) -> Result<(), NetworkError> {
        // The driver refuses to start without a configuration.
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(NetworkError::interface)?;

        self.wifi.start().map_err(NetworkError::interface)?;
        info!("Wifi started");
        Ok(())
    }

    fn begin_connect(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        let wifi_configuration = Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| NetworkError::interface("SSID is too long"))?,
            bssid: None,
            auth_method,
            password: password
                .try_into()
                .map_err(|_| NetworkError::interface("password is too long"))?,
            channel: None,
            ..Default::default()
        });

        self.wifi
            .set_configuration(&wifi_configuration)
            .map_err(NetworkError::interface)?;

        // Non-blocking: the caller polls `is_connected`.
        self.wifi
            .wifi_mut()
            .connect()
            .map_err(NetworkError::interface)
    }

    fn is_connected(&self) -> Result<bool, NetworkError> {
        self.wifi.is_up().map_err(NetworkError::interface)
    }

    fn ip_info(&self) -> Result<String, NetworkError> {
        let ip_info = self
            .wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map_err(NetworkError::interface)?;

        Ok(format!("{:?}", ip_info))
    }

    fn disconnect(&mut self) -> Result<(), NetworkError> {
        self.wifi.disconnect().map_err(NetworkError::interface)?;
        info!("Wifi disconnected");
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), NetworkError> {
        self.wifi.stop().map_err(NetworkError::interface)?;
        info!("Wifi stopped");
        Ok(())
    }
}

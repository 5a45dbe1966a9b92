use secrecy::ExposeSecret;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;

use crate::client::config::Config;
use crate::client::consts::BIDI_SERVICE;

/// The live service authenticates with a key query parameter on the
/// upgrade request rather than a header.
pub fn build_request(config: &Config) -> tokio_tungstenite::tungstenite::Result<Request> {
    let url = format!(
        "{}/{}?key={}",
        config.base_url(),
        BIDI_SERVICE,
        config.api_key().expose_secret()
    );
    url.into_client_request()
}

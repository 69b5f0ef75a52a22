pub mod bridge;
pub mod client;
pub mod mix_client;
pub mod player_bridge;

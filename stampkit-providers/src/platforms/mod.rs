//! Platform descriptors, one module per identity source.

mod brightid;
mod discord;
mod ens;
mod eth;
mod gitcoin;
mod github;
mod google;
mod gtc_staking;
mod linkedin;
mod nft;
mod twitter;

pub use brightid::brightid_descriptor;
pub use discord::discord_descriptor;
pub use ens::ens_descriptor;
pub use eth::eth_descriptor;
pub use gitcoin::gitcoin_descriptor;
pub use github::github_descriptor;
pub use google::google_descriptor;
pub use gtc_staking::gtc_staking_descriptor;
pub use linkedin::linkedin_descriptor;
pub use nft::nft_descriptor;
pub use twitter::twitter_descriptor;

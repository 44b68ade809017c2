//! # Orbit Common Crate
//!
//! Shared building blocks of the Orbit beacon-chain economics.
//!
//! ## Modules
//! - `economic_constants`: mainnet defaults for issuance, feedback, rewards and bail-outs
//! - `config`: `EconomicsConfig` TOML loader and validation
//! - `uint256`: 256-bit unsigned integer with SSZ and decimal JSON encodings
//!
//! ## Usage
//! ```rust,ignore
//! let cfg = orbit_common::config::load_from_file("economics.toml")?;
//! let v: Uint256 = "32000000000".parse()?;
//! ```

pub mod config;
pub mod economic_constants;
pub mod uint256;

pub use config::{load_from_file, ConfigError, DepositPlan, EconomicsConfig};
pub use uint256::{Uint256, Uint256Error};

use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Socket address the risk API binds to (default: 0.0.0.0:3000)
    pub api_addr: String,

    /// Identifier of the collateral asset (default: ETH)
    pub collateral_asset: String,

    /// Optional seed price for the collateral asset, in value units.
    /// When unset, no metrics are computable until a price is published.
    pub collateral_price_usd: Option<f64>,

    /// Decimals of the on-chain collateral amount (default: 18, wei)
    pub collateral_decimals: u8,

    /// Decimals of the on-chain debt amount (default: 18)
    pub debt_decimals: u8,

    /// Denominator of the on-chain liquidation threshold (default: 10000, basis points)
    pub liquidation_threshold_denominator: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let collateral_price_usd = match std::env::var("COLLATERAL_PRICE_USD") {
            Ok(raw) => {
                let price: f64 = raw
                    .parse()
                    .map_err(|_| anyhow::anyhow!("COLLATERAL_PRICE_USD must be a valid number"))?;
                if !price.is_finite() || price <= 0.0 {
                    anyhow::bail!("COLLATERAL_PRICE_USD must be a positive number");
                }
                Some(price)
            }
            Err(_) => None,
        };

        let liquidation_threshold_denominator: u64 =
            std::env::var("LIQUIDATION_THRESHOLD_DENOMINATOR")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("LIQUIDATION_THRESHOLD_DENOMINATOR must be a valid u64")
                })?;
        if liquidation_threshold_denominator == 0 {
            anyhow::bail!("LIQUIDATION_THRESHOLD_DENOMINATOR must be greater than zero");
        }

        Ok(Self {
            api_addr: std::env::var("MINILEND_API_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            collateral_asset: std::env::var("COLLATERAL_ASSET")
                .unwrap_or_else(|_| "ETH".to_string()),
            collateral_price_usd,
            collateral_decimals: std::env::var("COLLATERAL_DECIMALS")
                .unwrap_or_else(|_| "18".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("COLLATERAL_DECIMALS must be a valid u8"))?,
            debt_decimals: std::env::var("DEBT_DECIMALS")
                .unwrap_or_else(|_| "18".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DEBT_DECIMALS must be a valid u8"))?,
            liquidation_threshold_denominator,
        })
    }
}

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    models::websitemodel::{MarketplaceListing, Website},
    service::analysis_service::DomainAnalysis,
};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterWebsiteDto {
    #[validate(length(min = 1, max = 253, message = "Domain is required"))]
    pub domain: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteRegisteredDto {
    pub website: Website,
    pub analysis: DomainAnalysis,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceDto {
    pub listings: Vec<MarketplaceListing>,
    pub results: usize,
    /// The viewer's own sites are hidden from everyone else.
    pub low_trading_power: bool,
}

impl MarketplaceDto {
    pub fn new(listings: Vec<MarketplaceListing>, viewer_points: i64) -> Self {
        MarketplaceDto {
            results: listings.len(),
            listings,
            low_trading_power: viewer_points < crate::models::usermodel::MIN_VISIBLE_POINTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_dto_validation() {
        let ok = RegisterWebsiteDto {
            domain: "example.com".to_string(),
            description: None,
        };
        assert!(ok.validate().is_ok());

        let empty = RegisterWebsiteDto {
            domain: String::new(),
            description: None,
        };
        assert!(empty.validate().is_err());

        let long = RegisterWebsiteDto {
            domain: "example.com".to_string(),
            description: Some("x".repeat(501)),
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn low_trading_power_follows_balance() {
        assert!(MarketplaceDto::new(Vec::new(), 0).low_trading_power);
        assert!(MarketplaceDto::new(Vec::new(), -20).low_trading_power);
        assert!(!MarketplaceDto::new(Vec::new(), 1).low_trading_power);
    }
}

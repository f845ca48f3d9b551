//! Points d'un wallet via Firestore REST
//! Lookup simple avec valeurs par défaut: ne fait jamais échouer la requête

use reqwest::Client;
use serde_json::Value;

use crate::types::PointsData;

const FIRESTORE_API_URL: &str = "https://firestore.googleapis.com/v1";

/// Client du datastore points
#[derive(Debug, Clone)]
pub struct PointsClient {
    client: Client,
    base_url: String,
    project_id: Option<String>,
}

impl PointsClient {
    pub fn new(client: Client, project_id: Option<String>) -> Self {
        Self {
            client,
            base_url: FIRESTORE_API_URL.to_string(),
            project_id,
        }
    }

    /// Points d'un wallet. Tout échec (document absent, upstream down,
    /// projet non configuré) retombe sur les valeurs zéro.
    pub async fn get_wallet_points(&self, wallet: &str) -> PointsData {
        let project_id = match &self.project_id {
            Some(id) => id,
            None => return PointsData::zero(wallet),
        };

        let url = format!(
            "{}/projects/{}/databases/(default)/documents/points/{}",
            self.base_url, project_id, wallet
        );

        let document = match self.fetch_document(&url).await {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("points indisponibles pour {}: {}", wallet, e);
                return PointsData::zero(wallet);
            }
        };

        parse_points(wallet, &document)
    }

    async fn fetch_document(&self, url: &str) -> anyhow::Result<Value> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Firestore status {}", response.status());
        }
        Ok(response.json::<Value>().await?)
    }
}

/// Extrait un champ numérique d'un document Firestore
/// ({"fields": {name: {"doubleValue"| "integerValue": ...}}})
fn field_number(document: &Value, name: &str) -> Option<f64> {
    let field = document.get("fields")?.get(name)?;
    if let Some(v) = field.get("doubleValue") {
        return v.as_f64();
    }
    if let Some(v) = field.get("integerValue") {
        // Firestore encode les entiers en chaînes
        return v
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .or_else(|| v.as_f64());
    }
    None
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn parse_points(wallet: &str, document: &Value) -> PointsData {
    if document.get("fields").is_none() {
        return PointsData::zero(wallet);
    }

    let deposit = field_number(document, "total_activity_deposit_points").unwrap_or(0.0);
    let borrow = field_number(document, "total_activity_borrow_points").unwrap_or(0.0);
    let referral_deposit = field_number(document, "total_referral_deposit_points").unwrap_or(0.0);
    let referral_borrow = field_number(document, "total_referral_borrow_points").unwrap_or(0.0);
    let social = field_number(document, "socialPoints").unwrap_or(0.0);

    let owner = document
        .get("fields")
        .and_then(|f| f.get("owner"))
        .and_then(|o| o.get("stringValue"))
        .and_then(|v| v.as_str())
        .unwrap_or(wallet);

    // Le rank stocké est 1-based, exposé 0-based; absent => null
    let rank = field_number(document, "rank")
        .filter(|r| *r > 0.0)
        .map(|r| r as i64 - 1);

    PointsData {
        owner: owner.to_string(),
        deposit_points: round4(deposit),
        borrow_points: round4(borrow),
        referral_points: round4(referral_deposit + referral_borrow),
        total_points: deposit + borrow + referral_deposit + referral_borrow + social,
        rank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_points_document() {
        let doc = json!({
            "fields": {
                "owner": {"stringValue": "WalletABC"},
                "total_activity_deposit_points": {"doubleValue": 123.45678},
                "total_activity_borrow_points": {"doubleValue": 10.0},
                "total_referral_deposit_points": {"doubleValue": 1.5},
                "total_referral_borrow_points": {"doubleValue": 0.5},
                "socialPoints": {"doubleValue": 2.0},
                "rank": {"integerValue": "42"}
            }
        });

        let points = parse_points("WalletABC", &doc);
        assert_eq!(points.owner, "WalletABC");
        assert_eq!(points.deposit_points, 123.4568); // arrondi 4 décimales
        assert_eq!(points.borrow_points, 10.0);
        assert_eq!(points.referral_points, 2.0);
        assert_eq!(points.total_points, 123.45678 + 10.0 + 1.5 + 0.5 + 2.0);
        assert_eq!(points.rank, Some(41)); // rank 0-based
    }

    #[test]
    fn test_parse_points_missing_document_defaults() {
        let doc = json!({"error": {"code": 404}});
        let points = parse_points("W", &doc);
        assert_eq!(points.owner, "W");
        assert_eq!(points.total_points, 0.0);
        assert_eq!(points.rank, None);
    }

    #[tokio::test]
    async fn test_no_project_id_returns_zero() {
        let client = PointsClient::new(Client::new(), None);
        let points = client.get_wallet_points("W").await;
        assert_eq!(points.total_points, 0.0);
        assert_eq!(points.owner, "W");
    }
}

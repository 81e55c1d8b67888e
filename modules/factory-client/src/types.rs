use serde::{Deserialize, Serialize};

/// Envelope every factory endpoint wraps its payload in.
#[derive(Debug, Deserialize)]
pub struct FactoryEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Request body for `POST /api/generate`.
#[derive(Debug, Serialize)]
pub struct ProductionRequest<'a> {
    pub item_id: i64,
    pub video_type: &'a str,
}

/// Artifacts returned by a completed production run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProducedArtifacts {
    pub video_path: Option<String>,
    pub thumbnail_path: Option<String>,
}

/// Request body for `POST /api/curate/premium`.
#[derive(Debug, Serialize)]
pub struct CurationRequest {
    pub controversy_count: u32,
    pub explainer_count: u32,
    pub min_quality_score: f64,
}

/// One curated item reference.
#[derive(Debug, Clone, Deserialize)]
pub struct CuratedItem {
    pub item_id: i64,
    #[serde(default)]
    pub quality_score: f64,
}

/// Curation picks grouped by production category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurationPicks {
    #[serde(default)]
    pub controversy: Vec<CuratedItem>,
    #[serde(default)]
    pub explainer: Vec<CuratedItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_production_envelope() {
        let body = r#"{"success": true, "data": {"video_path": "/out/v.mp4", "thumbnail_path": "/out/t.jpg"}}"#;
        let parsed: FactoryEnvelope<ProducedArtifacts> = serde_json::from_str(body).unwrap();
        assert!(parsed.success);
        let data = parsed.data.unwrap();
        assert_eq!(data.video_path.as_deref(), Some("/out/v.mp4"));
    }

    #[test]
    fn parses_curation_picks() {
        let body = r#"{"success": true, "data": {"controversy": [{"item_id": 7, "quality_score": 8.1}], "explainer": []}}"#;
        let parsed: FactoryEnvelope<CurationPicks> = serde_json::from_str(body).unwrap();
        let picks = parsed.data.unwrap();
        assert_eq!(picks.controversy.len(), 1);
        assert_eq!(picks.controversy[0].item_id, 7);
        assert!(picks.explainer.is_empty());
    }

    #[test]
    fn parses_failure_envelope() {
        let body = r#"{"success": false, "error": "renderer offline"}"#;
        let parsed: FactoryEnvelope<ProducedArtifacts> = serde_json::from_str(body).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error.as_deref(), Some("renderer offline"));
        assert!(parsed.data.is_none());
    }
}

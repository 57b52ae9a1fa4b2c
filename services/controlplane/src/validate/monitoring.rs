//! Monitoring instance validation.
use crate::model::{CreateMonitoringRequest, MonitoringKind, UpdateMonitoringRequest};
use crate::validate::ValidationError;
use crate::validate::common::{validate_name_label, validate_url_field};

pub(super) fn validate_monitoring_create(
    request: &CreateMonitoringRequest,
) -> Result<(), ValidationError> {
    validate_name_label(&request.name, "name")?;
    validate_url_field(&request.url, "url")?;

    match request.kind {
        MonitoringKind::Pmm => {
            let pmm = request.pmm.as_ref().ok_or_else(|| {
                ValidationError::Structural("pmm key is required for type pmm".to_string())
            })?;
            if pmm.api_key.is_empty() && (pmm.user.is_empty() || pmm.password.is_empty()) {
                return Err(ValidationError::Structural(
                    "pmm.apiKey or pmm.user with pmm.password must be provided".to_string(),
                ));
            }
        }
    }
    Ok(())
}

pub(super) fn validate_monitoring_update(
    request: &UpdateMonitoringRequest,
) -> Result<(), ValidationError> {
    if !request.url.is_empty() {
        validate_url_field(&request.url, "url")?;
    }
    // An absent type leaves the instance kind unchanged and needs no section.
    if let Some(kind) = request.kind {
        match kind {
            MonitoringKind::Pmm => {
                if request.pmm.is_none() {
                    return Err(ValidationError::Structural(
                        "pmm key is required for type pmm".to_string(),
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PmmAuth;

    fn create_request(pmm: Option<PmmAuth>) -> CreateMonitoringRequest {
        CreateMonitoringRequest {
            name: "pmm-main".to_string(),
            url: "https://pmm.example.com".to_string(),
            kind: MonitoringKind::Pmm,
            pmm,
        }
    }

    #[test]
    fn create_requires_pmm_credentials() {
        assert!(validate_monitoring_create(&create_request(None)).is_err());

        let empty = PmmAuth::default();
        assert!(validate_monitoring_create(&create_request(Some(empty))).is_err());

        let api_key = PmmAuth {
            api_key: "key".to_string(),
            ..Default::default()
        };
        validate_monitoring_create(&create_request(Some(api_key))).expect("api key");

        let user_password = PmmAuth {
            user: "admin".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        };
        validate_monitoring_create(&create_request(Some(user_password))).expect("user+password");

        let user_only = PmmAuth {
            user: "admin".to_string(),
            ..Default::default()
        };
        assert!(validate_monitoring_create(&create_request(Some(user_only))).is_err());
    }

    #[test]
    fn create_rejects_invalid_name_and_url() {
        let mut request = create_request(Some(PmmAuth {
            api_key: "key".to_string(),
            ..Default::default()
        }));
        request.name = "Bad_Name".to_string();
        assert!(validate_monitoring_create(&request).is_err());

        let mut request = create_request(Some(PmmAuth {
            api_key: "key".to_string(),
            ..Default::default()
        }));
        request.url = "not a url".to_string();
        assert!(validate_monitoring_create(&request).is_err());
    }

    #[test]
    fn update_rules() {
        validate_monitoring_update(&UpdateMonitoringRequest::default()).expect("empty update");

        let bad_url = UpdateMonitoringRequest {
            url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(validate_monitoring_update(&bad_url).is_err());

        let typed_without_section = UpdateMonitoringRequest {
            kind: Some(MonitoringKind::Pmm),
            ..Default::default()
        };
        assert!(validate_monitoring_update(&typed_without_section).is_err());

        let typed_with_section = UpdateMonitoringRequest {
            kind: Some(MonitoringKind::Pmm),
            pmm: Some(PmmAuth::default()),
            ..Default::default()
        };
        validate_monitoring_update(&typed_with_section).expect("typed update");
    }
}

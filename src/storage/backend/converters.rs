use crate::storage::models::{Attribution, NewVisitor, VisitorRecord};
use migration::entities::visitor;

/// 将 Sea-ORM Model 转换为 VisitorRecord
pub fn model_to_record(model: visitor::Model) -> VisitorRecord {
    VisitorRecord {
        visitor_id: model.visitor_id,
        token: model.hashids,
        ip_address: model.ip_address,
        hostname: model.hostname,
        request_uri: model.request_uri,
        http_referer: model.http_referer,
        remote_port: model.remote_port,
        user_agent: model.user_agent,
        visits_count: model.visits_count,
        last_visit: model.last_visit,
        created: model.created,
        attribution: Attribution {
            utm_source: model.utm_source,
            utm_medium: model.utm_medium,
            utm_campaign: model.utm_campaign,
            utm_term: model.utm_term,
            utm_content: model.utm_content,
        },
    }
}

/// 新访客的 ActiveModel：id 由数据库生成，token 留空待回填
pub fn new_visitor_to_active_model(visitor: &NewVisitor) -> visitor::ActiveModel {
    use sea_orm::ActiveValue::*;

    visitor::ActiveModel {
        visitor_id: NotSet,
        hashids: Set(None),
        ip_address: Set(visitor.ip_address.clone()),
        hostname: Set(visitor.hostname.clone()),
        request_uri: Set(visitor.request_uri.clone()),
        http_referer: Set(visitor.http_referer.clone()),
        remote_port: Set(visitor.remote_port.clone()),
        user_agent: Set(visitor.user_agent.clone()),
        visits_count: Set(1),
        last_visit: Set(visitor.created),
        created: Set(visitor.created),
        utm_source: Set(visitor.attribution.utm_source.clone()),
        utm_medium: Set(visitor.attribution.utm_medium.clone()),
        utm_campaign: Set(visitor.attribution.utm_campaign.clone()),
        utm_term: Set(visitor.attribution.utm_term.clone()),
        utm_content: Set(visitor.attribution.utm_content.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::ActiveValue;

    fn new_visitor() -> NewVisitor {
        NewVisitor {
            ip_address: Some("192.0.2.10".to_string()),
            hostname: Some("192.0.2.10".to_string()),
            request_uri: Some("/pricing?utm_source=ads".to_string()),
            http_referer: Some("https://search.example/".to_string()),
            remote_port: Some("40022".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            attribution: Attribution {
                utm_source: Some("ads".to_string()),
                ..Attribution::default()
            },
            created: Utc::now(),
        }
    }

    #[test]
    fn test_active_model_leaves_id_and_token_for_backend() {
        let new = new_visitor();
        let model = new_visitor_to_active_model(&new);

        assert!(matches!(model.visitor_id, ActiveValue::NotSet));
        assert_eq!(model.hashids, ActiveValue::Set(None));
        assert_eq!(model.visits_count, ActiveValue::Set(1));
        assert_eq!(model.last_visit, ActiveValue::Set(new.created));
        assert_eq!(model.utm_source, ActiveValue::Set(Some("ads".to_string())));
    }

    #[test]
    fn test_model_to_record() {
        let now = Utc::now();
        let model = visitor::Model {
            visitor_id: 9,
            hashids: Some("tok".to_string()),
            ip_address: None,
            hostname: None,
            request_uri: None,
            http_referer: None,
            remote_port: None,
            user_agent: Some("Mozilla/5.0".to_string()),
            visits_count: 3,
            last_visit: now,
            created: now,
            utm_source: None,
            utm_medium: Some("email".to_string()),
            utm_campaign: None,
            utm_term: None,
            utm_content: None,
        };

        let record = model_to_record(model);
        assert_eq!(record.visitor_id, 9);
        assert_eq!(record.token.as_deref(), Some("tok"));
        assert_eq!(record.visits_count, 3);
        assert_eq!(record.attribution.utm_medium.as_deref(), Some("email"));
    }
}

// core/finance_service.rs
use crate::core::resource::QueryContext;
use crate::models::Invoice;
use crate::services::cache::{QueryKey, ResourceKind};
use crate::services::http::ApiRequest;
use crate::utils::error::Result;
use crate::utils::validation::validate_positive_amount;
use serde_json::Value;
use tracing::info;

pub const PAYMENT_RECORDED: &str = "Paiement enregistré";

/// Factures et paiements; les montants sont toujours calculés par le serveur
#[derive(Clone)]
pub struct FinanceService {
    ctx: QueryContext,
}

impl FinanceService {
    pub fn new(ctx: QueryContext) -> Self {
        Self { ctx }
    }

    pub fn invoice_key(student_id: i64) -> QueryKey {
        QueryKey::item(ResourceKind::Invoice, student_id)
    }

    /// Facture à jour d'un candidat (recalculée par le serveur)
    pub async fn generate_invoice(&self, student_id: i64) -> Result<Invoice> {
        let request = ApiRequest::post(format!("/Invoice/generate/{}", student_id));
        self.ctx.read_as(Self::invoice_key(student_id), request).await
    }

    /// Enregistrer un paiement, puis rafraîchir facture et liste des candidats
    pub async fn record_payment(&self, student_id: i64, amount: f64) -> Result<Option<Value>> {
        if let Err(e) = validate_positive_amount(amount) {
            return Err(self.ctx.reject(e));
        }

        let request = ApiRequest::post("/Payment/record")
            .param("studentId", student_id)
            .param("amount", amount);
        let recorded = self
            .ctx
            .mutate(request, ResourceKind::Invoice, PAYMENT_RECORDED)
            .await?;

        info!(student_id, amount, "Paiement enregistré");
        Ok(recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resource::test_support::harness;
    use crate::models::PaymentStatus;
    use crate::utils::error::ApiError;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn invoice(paid: f64, status: &str) -> Value {
        json!({
            "id": 7, "studentId": 12, "status": status,
            "baseCourseFee": 30000.0, "examUnitFee": 2000.0, "stampUnitFee": 300.0,
            "totalAmount": 34600.0, "paidAmount": paid,
            "breakdown": "{\"exams\":2}",
            "paymentHistory": []
        })
    }

    #[tokio::test]
    async fn test_payment_refreshes_invoice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Invoice/generate/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(invoice(0.0, "NOT_PAID")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/Payment/record"))
            .and(query_param("studentId", "12"))
            .and(query_param("amount", "10000"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/Invoice/generate/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(invoice(10000.0, "PARTIALLY_PAID")))
            .mount(&server)
            .await;

        let h = harness(&server);
        let service = FinanceService::new(h.ctx.clone());

        let before = service.generate_invoice(12).await.unwrap();
        assert_eq!(before.status, PaymentStatus::NotPaid);
        assert_eq!(before.breakdown_json(), Some(json!({"exams": 2})));

        service.record_payment(12, 10000.0).await.unwrap();
        assert_eq!(h.ctx.cache.invalidation_count(ResourceKind::Student).await, 1);

        let after = service.generate_invoice(12).await.unwrap();
        assert_eq!(after.paid_amount, 10000.0);
        assert_eq!(after.status, PaymentStatus::PartiallyPaid);
        assert_eq!(h.notifier.successes(), vec![PAYMENT_RECORDED.to_string()]);
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let server = MockServer::start().await;
        let h = harness(&server);
        let service = FinanceService::new(h.ctx.clone());

        for amount in [0.0, -50.0, f64::NAN] {
            let err = service.record_payment(12, amount).await.unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)));
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}

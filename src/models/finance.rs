use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    NotPaid,
    PartiallyPaid,
}

/// Facture calculée par le serveur; le client ne recalcule jamais les montants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i64,
    pub student_id: i64,
    pub status: PaymentStatus,
    pub base_course_fee: f64,
    pub exam_unit_fee: f64,
    pub stamp_unit_fee: f64,
    pub total_amount: f64,
    pub paid_amount: f64,
    /// Détail du calcul, chaîne JSON produite par le serveur
    #[serde(default)]
    pub breakdown: Option<String>,
    #[serde(default)]
    pub payment_history: Option<Vec<Payment>>,
}

impl Invoice {
    /// Détail décodé, `None` si absent ou illisible
    pub fn breakdown_json(&self) -> Option<serde_json::Value> {
        self.breakdown
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub amount: f64,
    pub date: String,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invoice_wire_format() {
        let raw = json!({
            "id": 9,
            "studentId": 12,
            "status": "PARTIALLY_PAID",
            "baseCourseFee": 30000.0,
            "examUnitFee": 2000.0,
            "stampUnitFee": 300.0,
            "totalAmount": 34600.0,
            "paidAmount": 10000.0,
            "breakdown": "{\"exams\":2}",
            "paymentHistory": [
                {"id": 1, "amount": 10000.0, "date": "2026-09-01", "student": {"id": 12}, "status": "PARTIALLY_PAID"}
            ]
        });
        let invoice: Invoice = serde_json::from_value(raw).unwrap();
        assert_eq!(invoice.status, PaymentStatus::PartiallyPaid);
        assert_eq!(invoice.payment_history.as_ref().map(Vec::len), Some(1));
        assert_eq!(invoice.breakdown_json(), Some(json!({"exams": 2})));
    }
}

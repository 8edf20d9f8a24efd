// core/assignment.rs
use crate::core::candidat_service::CandidatService;
use crate::core::exam_service::{ExamSlotService, ExamStudentService};
use crate::models::{
    ExamCategory, ExamResult, ExamSlot, ExamStatus, ExamStudent, ExamStudentDraft,
    ExamStudentPatch, Student, StudentStatus,
};
use crate::utils::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Participation affichée dans la liste d'un créneau
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedParticipant {
    pub participation: ExamStudent,
    /// Absent si le candidat n'est plus en formation
    pub student: Option<Student>,
}

/// Candidats d'un créneau: inscrits et pouvant l'être
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRoster {
    pub assigned: Vec<AssignedParticipant>,
    pub eligible: Vec<Student>,
}

/// Affectation des candidats aux créneaux d'examen.
///
/// L'exclusion des conflits de date est indicative: elle filtre ce qui est
/// proposé, le serveur reste seul juge.
#[derive(Clone)]
pub struct ExamAssignmentWorkflow {
    students: CandidatService,
    slots: ExamSlotService,
    participations: ExamStudentService,
}

impl ExamAssignmentWorkflow {
    pub fn new(
        students: CandidatService,
        slots: ExamSlotService,
        participations: ExamStudentService,
    ) -> Self {
        Self {
            students,
            slots,
            participations,
        }
    }

    /// Inscrits du créneau et candidats en formation encore libres ce jour-là
    pub async fn roster(&self, slot: &ExamSlot, search: &str) -> Result<SlotRoster> {
        let (in_training, slot_records, all_records) = tokio::try_join!(
            self.students.list_by_status(StudentStatus::InTraining),
            self.participations.list_for_slot(slot.id),
            self.participations.list_all(),
        )?;

        let assigned_ids: HashSet<i64> = slot_records.iter().map(|r| r.student_id).collect();
        let busy_ids: HashSet<i64> = all_records
            .iter()
            .filter(|r| record_date(r, slot) == Some(slot.exam_date))
            .map(|r| r.student_id)
            .collect();

        let by_id: HashMap<i64, &Student> = in_training.iter().map(|s| (s.id, s)).collect();
        let assigned = slot_records
            .into_iter()
            .map(|participation| AssignedParticipant {
                student: by_id.get(&participation.student_id).map(|s| (*s).clone()),
                participation,
            })
            .collect();

        let eligible: Vec<Student> = in_training
            .iter()
            .filter(|s| !assigned_ids.contains(&s.id) && !busy_ids.contains(&s.id))
            .filter(|s| s.matches_search(search))
            .cloned()
            .collect();

        debug!(
            slot_id = slot.id,
            assigned = assigned_ids.len(),
            eligible = eligible.len(),
            "Liste du créneau calculée"
        );
        Ok(SlotRoster { assigned, eligible })
    }

    /// Créneaux actifs sans autre épreuve du candidat le même jour
    pub async fn available_slots(&self, student_id: i64) -> Result<Vec<ExamSlot>> {
        let (active, records) = tokio::try_join!(
            self.slots.list_active(),
            self.participations.list_for_student(student_id),
        )?;

        let slot_dates: HashMap<i64, NaiveDate> = active.iter().map(|s| (s.id, s.exam_date)).collect();
        let busy_dates: HashSet<NaiveDate> = records
            .iter()
            .filter_map(|r| r.date.or_else(|| r.exam_slot_id.and_then(|id| slot_dates.get(&id).copied())))
            .collect();

        Ok(active
            .into_iter()
            .filter(|slot| !busy_dates.contains(&slot.exam_date))
            .collect())
    }

    /// Inscrire un candidat au créneau (épreuve du code par défaut)
    pub async fn assign(
        &self,
        slot: &ExamSlot,
        student_id: i64,
        category: Option<ExamCategory>,
    ) -> Result<ExamStudent> {
        let draft = ExamStudentDraft {
            student_id,
            exam_slot_id: slot.id,
            category: category.unwrap_or_default(),
            status: ExamStatus::Planned,
            date: slot.exam_date,
        };

        let created = self.participations.create(&draft).await?;
        info!(student_id, slot_id = slot.id, category = %draft.category, "Candidat affecté");
        Ok(created)
    }

    pub async fn unassign(&self, exam_student_id: i64) -> Result<()> {
        self.participations.delete(exam_student_id).await?;
        info!(exam_student_id, "Candidat retiré");
        Ok(())
    }

    /// Saisir un résultat; le statut suit (`PENDING` remet en `PLANNED`)
    pub async fn record_result(&self, exam_student_id: i64, result: ExamResult) -> Result<ExamStudent> {
        self.participations
            .update(exam_student_id, &ExamStudentPatch::result(result))
            .await
    }
}

/// Date d'une participation, celle du créneau cible si elle n'est pas renseignée
fn record_date(record: &ExamStudent, slot: &ExamSlot) -> Option<NaiveDate> {
    record
        .date
        .or_else(|| (record.exam_slot_id == Some(slot.id)).then_some(slot.exam_date))
}

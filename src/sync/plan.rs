//! Dependency ordering of entity kinds into sequential stages.
//!
//! The stage table is static configuration reflecting real foreign-key
//! dependencies on the accounting side: product groups must land before the
//! products that reference them, supplier groups before suppliers, and
//! invoices last since they reference customers and products. Kinds within
//! one stage have no dependencies on each other and may sync concurrently.

use crate::sync::types::{EntityKind, PlanError};

use std::collections::BTreeMap;

/// Ordered stage table over the fixed set of entity kinds.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    stages: Vec<Vec<EntityKind>>,
}

impl SyncPlan {
    /// Build a plan from an explicit stage table, validating it eagerly.
    pub fn new(stages: Vec<Vec<EntityKind>>) -> Result<Self, PlanError> {
        let plan = Self { stages };
        plan.validate()?;
        Ok(plan)
    }

    /// The standard dependency ordering used by production runs.
    pub fn standard() -> Self {
        Self {
            stages: vec![
                vec![
                    EntityKind::PaymentTerms,
                    EntityKind::VatAccounts,
                    EntityKind::ProductGroups,
                    EntityKind::SupplierGroups,
                    EntityKind::Departments,
                    EntityKind::AccountingYears,
                ],
                vec![
                    EntityKind::Products,
                    EntityKind::Suppliers,
                    EntityKind::Customers,
                    EntityKind::Accounts,
                    EntityKind::DepartmentalDistributions,
                    EntityKind::Journals,
                ],
                vec![EntityKind::Invoices],
            ],
        }
    }

    /// Check that every known entity kind appears in exactly one stage.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut seen: BTreeMap<EntityKind, usize> = BTreeMap::new();
        for stage in &self.stages {
            for kind in stage {
                *seen.entry(*kind).or_insert(0) += 1;
            }
        }
        for kind in EntityKind::ALL {
            match seen.get(&kind) {
                None => return Err(PlanError::MissingEntity(kind)),
                Some(1) => {}
                Some(_) => return Err(PlanError::DuplicateEntity(kind)),
            }
        }
        Ok(())
    }

    pub fn stages(&self) -> &[Vec<EntityKind>] {
        &self.stages
    }

    /// Restrict the plan to a subset of kinds, preserving stage order and
    /// dropping stages left empty. Used by daily sync.
    pub fn stages_for(&self, subset: &[EntityKind]) -> Vec<Vec<EntityKind>> {
        self.stages
            .iter()
            .map(|stage| {
                stage
                    .iter()
                    .copied()
                    .filter(|kind| subset.contains(kind))
                    .collect::<Vec<_>>()
            })
            .filter(|stage| !stage.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_plan_covers_every_kind_exactly_once() {
        let plan = SyncPlan::standard();
        plan.validate().unwrap();

        let flattened: Vec<EntityKind> = plan.stages().iter().flatten().copied().collect();
        assert_eq!(flattened.len(), EntityKind::ALL.len());
    }

    #[test]
    fn a_missing_kind_is_rejected() {
        let result = SyncPlan::new(vec![vec![EntityKind::PaymentTerms]]);
        assert!(matches!(result, Err(PlanError::MissingEntity(_))));
    }

    #[test]
    fn a_duplicated_kind_is_rejected() {
        let mut stages: Vec<Vec<EntityKind>> = vec![EntityKind::ALL.to_vec()];
        stages.push(vec![EntityKind::Products]);
        let result = SyncPlan::new(stages);
        assert_eq!(result.unwrap_err(), PlanError::DuplicateEntity(EntityKind::Products));
    }

    #[test]
    fn subset_preserves_stage_order_and_drops_empty_stages() {
        let plan = SyncPlan::standard();
        let stages = plan.stages_for(&[
            EntityKind::Invoices,
            EntityKind::Products,
            EntityKind::ProductGroups,
        ]);

        assert_eq!(
            stages,
            vec![
                vec![EntityKind::ProductGroups],
                vec![EntityKind::Products],
                vec![EntityKind::Invoices],
            ]
        );
    }
}

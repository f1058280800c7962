//! # Estate Service
//!
//! Orchestrates commands against the estate aggregate.
//!
//! Each command loads the current snapshot, applies the command to it,
//! drains the events it raised and commits snapshot and events together
//! with a compare-and-swap on the version read at load time. A rejected
//! command commits nothing. A lost race surfaces as
//! [`ApplicationError::ConcurrentModification`]; [`EstateService::execute_with_retry`]
//! reloads and reapplies up to the configured limit.

use crate::application::commands::{CommandOutput, CommandResult, CreateEstate, EstateCommand};
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::views::EstateView;
use crate::domain::entities::{DistributionReadiness, Estate, EstateBuilder};
use crate::domain::events::EstateEvent;
use crate::domain::services::{InflationAdjuster, WaterfallPlan};
use crate::domain::value_objects::{EstateId, Money, SettlementPolicy, UserId};
use crate::infrastructure::persistence::EstateRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};

/// Default number of reload-and-reapply attempts after a version conflict.
pub const DEFAULT_MAX_COMMAND_RETRIES: u32 = 3;

/// Configuration for [`EstateService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstateServiceConfig {
    /// Retries after a version conflict in `execute_with_retry`.
    pub max_command_retries: u32,
    /// Policy captured into newly created estates.
    pub policy: SettlementPolicy,
}

impl Default for EstateServiceConfig {
    fn default() -> Self {
        Self {
            max_command_retries: DEFAULT_MAX_COMMAND_RETRIES,
            policy: SettlementPolicy::default(),
        }
    }
}

impl EstateServiceConfig {
    /// Sets the retry limit.
    #[must_use]
    pub fn with_max_command_retries(mut self, retries: u32) -> Self {
        self.max_command_retries = retries;
        self
    }

    /// Sets the policy for new estates.
    #[must_use]
    pub fn with_policy(mut self, policy: SettlementPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Command and query entry point for estates.
#[derive(Debug, Clone)]
pub struct EstateService {
    repository: Arc<dyn EstateRepository>,
    adjuster: Arc<dyn InflationAdjuster>,
    config: EstateServiceConfig,
}

impl EstateService {
    /// Creates a new service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn EstateRepository>,
        adjuster: Arc<dyn InflationAdjuster>,
        config: EstateServiceConfig,
    ) -> Self {
        Self {
            repository,
            adjuster,
            config,
        }
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> &EstateServiceConfig {
        &self.config
    }

    /// Returns the name of the injected inflation adjuster.
    #[must_use]
    pub fn adjuster_name(&self) -> &'static str {
        self.adjuster.name()
    }

    /// Opens a new estate in `Draft`.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::Domain` if the dates or creator are invalid
    /// - `ApplicationError::Repository` if the id is already taken or
    ///   storage fails
    pub async fn create(&self, request: CreateEstate, actor: &UserId) -> ApplicationResult<EstateView> {
        let mut builder = EstateBuilder::new(request.date_of_death, request.currency, actor.clone())
            .policy(self.config.policy.clone());
        if let Some(id) = request.estate_id {
            builder = builder.id(id);
        }
        if let Some(date) = request.valuation_date {
            builder = builder.valuation_date(date);
        }
        let mut estate = builder.build()?;
        let events = estate.take_pending_events();

        let span = info_span!(
            "estate_command",
            estate_id = %estate.id(),
            command = "create",
            actor = %actor
        );
        self.insert_new(estate, events).instrument(span).await
    }

    async fn insert_new(
        &self,
        estate: Estate,
        events: Vec<EstateEvent>,
    ) -> ApplicationResult<EstateView> {
        self.repository.insert(&estate, &events).await?;
        info!(version = estate.version(), events = events.len(), "estate created");
        Ok(EstateView::from_estate(&estate)?)
    }

    /// Applies one command and commits it.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::NotFound` for an unknown estate
    /// - `ApplicationError::Domain` if the aggregate rejects the command
    /// - `ApplicationError::ConcurrentModification` if another command
    ///   committed between load and commit
    /// - `ApplicationError::Repository` on storage failure
    pub async fn execute(
        &self,
        estate_id: EstateId,
        command: EstateCommand,
        actor: &UserId,
    ) -> ApplicationResult<CommandResult> {
        let span = info_span!(
            "estate_command",
            estate_id = %estate_id,
            command = command.name(),
            actor = %actor
        );
        self.execute_once(estate_id, command, actor)
            .instrument(span)
            .await
    }

    /// Like [`execute`](Self::execute), but reloads and reapplies the
    /// command after a version conflict, at most `max_command_retries` times.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted, or the first
    /// non-retryable error.
    pub async fn execute_with_retry(
        &self,
        estate_id: EstateId,
        command: EstateCommand,
        actor: &UserId,
    ) -> ApplicationResult<CommandResult> {
        let mut attempt: u32 = 0;
        loop {
            match self.execute(estate_id, command.clone(), actor).await {
                Err(err) if err.is_retryable() && attempt < self.config.max_command_retries => {
                    attempt = attempt.saturating_add(1);
                    warn!(
                        estate_id = %estate_id,
                        command = command.name(),
                        attempt,
                        max = self.config.max_command_retries,
                        "retrying after concurrent modification"
                    );
                }
                result => return result,
            }
        }
    }

    async fn execute_once(
        &self,
        estate_id: EstateId,
        command: EstateCommand,
        actor: &UserId,
    ) -> ApplicationResult<CommandResult> {
        let mut estate = self.load(estate_id).await?;
        let expected_version = estate.version();

        let output = command
            .apply(&mut estate, actor, self.adjuster.as_ref())
            .inspect_err(|err| debug!(error = %err, kind = ?err.kind(), "command rejected"))?;
        let events = estate.take_pending_events();

        if let CommandOutput::Waterfall { plan } = &output {
            debug!(
                available = %plan.available(),
                allocations = plan.allocations().len(),
                remaining = %plan.remaining(),
                "waterfall plan applied"
            );
        }

        self.repository
            .commit(&estate, expected_version, &events)
            .await
            .map_err(|err| {
                if err.is_version_conflict() {
                    warn!(expected_version, error = %err, "version conflict on commit");
                }
                ApplicationError::from(err)
            })?;

        info!(
            version = estate.version(),
            status = %estate.status(),
            events = events.len(),
            "command committed"
        );
        Ok(CommandResult {
            output,
            estate: EstateView::from_estate(&estate)?,
        })
    }

    // ========== Queries ==========

    /// Returns the current projection of an estate.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::NotFound` for an unknown estate.
    pub async fn view(&self, estate_id: EstateId) -> ApplicationResult<EstateView> {
        let estate = self.load(estate_id).await?;
        Ok(EstateView::from_estate(&estate)?)
    }

    /// Returns the net estate value.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::NotFound` for an unknown estate.
    pub async fn net_value(&self, estate_id: EstateId) -> ApplicationResult<Money> {
        Ok(self.load(estate_id).await?.net_value()?)
    }

    /// Lists what prevents distribution and closure.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::NotFound` for an unknown estate.
    pub async fn distribution_readiness(
        &self,
        estate_id: EstateId,
    ) -> ApplicationResult<DistributionReadiness> {
        Ok(self.load(estate_id).await?.distribution_readiness()?)
    }

    /// Plans a waterfall for `available` cash without applying it.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::NotFound` for an unknown estate, or a
    /// domain error for a foreign-currency or negative amount.
    pub async fn waterfall_preview(
        &self,
        estate_id: EstateId,
        available: Money,
    ) -> ApplicationResult<WaterfallPlan> {
        let plan = self.load(estate_id).await?.waterfall_preview(available)?;
        debug!(
            estate_id = %estate_id,
            allocations = plan.allocations().len(),
            remaining = %plan.remaining(),
            "waterfall plan previewed"
        );
        Ok(plan)
    }

    /// Lists stored estate ids.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Repository` on storage failure.
    pub async fn list_ids(&self) -> ApplicationResult<Vec<EstateId>> {
        Ok(self.repository.list_ids().await?)
    }

    async fn load(&self, estate_id: EstateId) -> ApplicationResult<Estate> {
        self.repository
            .load(estate_id)
            .await?
            .ok_or_else(|| ApplicationError::estate_not_found(estate_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;
    use crate::domain::services::NoAdjustment;
    use crate::domain::value_objects::{Currency, DebtKind, EstateStatus};
    use crate::infrastructure::persistence::in_memory::InMemoryEstateRepository;
    use crate::infrastructure::persistence::{RepositoryError, RepositoryResult};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn kes(amount: i64) -> Money {
        Money::new(Decimal::new(amount, 0), Currency::new("KES").unwrap())
    }

    fn executor() -> UserId {
        UserId::new("executor-1")
    }

    fn create_request() -> CreateEstate {
        CreateEstate {
            estate_id: None,
            date_of_death: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            currency: Currency::new("KES").unwrap(),
            valuation_date: None,
        }
    }

    fn service(repository: Arc<dyn EstateRepository>, config: EstateServiceConfig) -> EstateService {
        EstateService::new(repository, Arc::new(NoAdjustment), config)
    }

    /// Lets a rival command commit just before each of the first `races` commits.
    #[derive(Debug)]
    struct RacingRepository {
        inner: InMemoryEstateRepository,
        races: AtomicU32,
    }

    impl RacingRepository {
        fn new(inner: InMemoryEstateRepository, races: u32) -> Self {
            Self {
                inner,
                races: AtomicU32::new(races),
            }
        }
    }

    #[async_trait]
    impl EstateRepository for RacingRepository {
        async fn insert(&self, estate: &Estate, events: &[EstateEvent]) -> RepositoryResult<()> {
            self.inner.insert(estate, events).await
        }

        async fn load(&self, id: EstateId) -> RepositoryResult<Option<Estate>> {
            self.inner.load(id).await
        }

        async fn commit(
            &self,
            estate: &Estate,
            expected_version: u64,
            events: &[EstateEvent],
        ) -> RepositoryResult<()> {
            let race = self
                .races
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if race {
                let mut rival = self
                    .inner
                    .load(estate.id())
                    .await?
                    .ok_or_else(|| RepositoryError::not_found("Estate", estate.id()))?;
                let version = rival.version();
                rival
                    .record_cash_receipt(kes(10), "rival deposit", None, &UserId::new("rival"))
                    .map_err(|e| RepositoryError::query(e.to_string()))?;
                let rival_events = rival.take_pending_events();
                self.inner.commit(&rival, version, &rival_events).await?;
            }
            self.inner.commit(estate, expected_version, events).await
        }

        async fn list_ids(&self) -> RepositoryResult<Vec<EstateId>> {
            self.inner.list_ids().await
        }
    }

    mod commands {
        use super::*;

        #[tokio::test]
        async fn create_then_activate() {
            let repo = InMemoryEstateRepository::new();
            let service = service(Arc::new(repo.clone()), EstateServiceConfig::default());

            let created = service.create(create_request(), &executor()).await.unwrap();
            assert_eq!(created.status, EstateStatus::Draft);
            assert_eq!(created.version, 1);

            let result = service
                .execute(created.id, EstateCommand::Activate, &executor())
                .await
                .unwrap();
            assert_eq!(result.output, CommandOutput::Applied);
            assert_eq!(result.estate.status, EstateStatus::Active);
            assert_eq!(result.estate.version, 2);

            let events = repo.all_events().await;
            let names: Vec<&str> = events.iter().map(|e| e.kind.name()).collect();
            assert_eq!(names, vec!["EstateCreated", "EstateActivated"]);
        }

        #[tokio::test]
        async fn create_captures_configured_policy() {
            let policy = SettlementPolicy {
                version: 7,
                ..SettlementPolicy::default()
            };
            let service = service(
                Arc::new(InMemoryEstateRepository::new()),
                EstateServiceConfig::default().with_policy(policy),
            );
            let created = service.create(create_request(), &executor()).await.unwrap();
            assert_eq!(created.policy_version, 7);
        }

        #[tokio::test]
        async fn duplicate_id_is_rejected() {
            let service = service(
                Arc::new(InMemoryEstateRepository::new()),
                EstateServiceConfig::default(),
            );
            let id = EstateId::new_v4();
            let request = CreateEstate {
                estate_id: Some(id),
                ..create_request()
            };
            service.create(request.clone(), &executor()).await.unwrap();
            let err = service.create(request, &executor()).await.unwrap_err();
            assert!(matches!(
                err,
                ApplicationError::Repository(RepositoryError::Duplicate { .. })
            ));
        }

        #[tokio::test]
        async fn unknown_estate_is_not_found() {
            let service = service(
                Arc::new(InMemoryEstateRepository::new()),
                EstateServiceConfig::default(),
            );
            let err = service
                .execute(EstateId::new_v4(), EstateCommand::Activate, &executor())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }

        #[tokio::test]
        async fn rejected_command_commits_nothing() {
            let repo = InMemoryEstateRepository::new();
            let service = service(Arc::new(repo.clone()), EstateServiceConfig::default());
            let created = service.create(create_request(), &executor()).await.unwrap();

            let err = service
                .execute(
                    created.id,
                    EstateCommand::Freeze {
                        reason: "x".to_string(),
                    },
                    &executor(),
                )
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);

            let view = service.view(created.id).await.unwrap();
            assert_eq!(view.version, 1);
            assert_eq!(repo.all_events().await.len(), 1);
        }

        #[tokio::test]
        async fn waterfall_spends_from_the_cash_pool() {
            let service = service(
                Arc::new(InMemoryEstateRepository::new()),
                EstateServiceConfig::default(),
            );
            let id = service.create(create_request(), &executor()).await.unwrap().id;
            let incurred = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
            let commands = vec![
                EstateCommand::Activate,
                EstateCommand::RecordCashReceipt {
                    amount: kes(5000),
                    source: "bank balance".to_string(),
                    reference: None,
                },
                EstateCommand::AddDebt {
                    kind: DebtKind::FuneralExpense,
                    creditor: "Lee Funeral Home".to_string(),
                    amount: kes(1000),
                    tier: None,
                    incurred_date: incurred,
                },
                EstateCommand::AddDebt {
                    kind: DebtKind::CreditCard,
                    creditor: "Card Issuer".to_string(),
                    amount: kes(3000),
                    tier: None,
                    incurred_date: incurred,
                },
            ];
            for command in commands {
                service.execute(id, command, &executor()).await.unwrap();
            }

            let preview = service.waterfall_preview(id, kes(5000)).await.unwrap();
            assert_eq!(preview.allocations().len(), 2);
            assert_eq!(service.view(id).await.unwrap().version, 5);

            let result = service
                .execute(id, EstateCommand::ExecuteWaterfall { available: kes(5000) }, &executor())
                .await
                .unwrap();
            let CommandOutput::Waterfall { plan } = result.output else {
                panic!("expected waterfall output");
            };
            assert_eq!(plan, preview);
            assert_eq!(result.estate.cash_pool, kes(1000));
            assert!(result.estate.debts.iter().all(|d| d.outstanding.is_zero()));
        }
    }

    mod concurrency {
        use super::*;

        #[tokio::test]
        async fn lost_race_is_a_concurrent_modification() {
            let inner = InMemoryEstateRepository::new();
            let service = service(
                Arc::new(RacingRepository::new(inner.clone(), 1)),
                EstateServiceConfig::default(),
            );
            let id = service.create(create_request(), &executor()).await.unwrap().id;

            let err = service
                .execute(id, EstateCommand::Activate, &executor())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConcurrentModification);
            assert!(err.is_retryable());

            let view = service.view(id).await.unwrap();
            assert_eq!(view.status, EstateStatus::Draft);
            assert_eq!(view.cash_pool, kes(10));
        }

        #[tokio::test]
        async fn retry_reapplies_on_fresh_state() {
            let service = service(
                Arc::new(RacingRepository::new(InMemoryEstateRepository::new(), 2)),
                EstateServiceConfig::default(),
            );
            let id = service.create(create_request(), &executor()).await.unwrap().id;

            let result = service
                .execute_with_retry(id, EstateCommand::Activate, &executor())
                .await
                .unwrap();
            assert_eq!(result.estate.status, EstateStatus::Active);
            assert_eq!(result.estate.cash_pool, kes(20));
            assert_eq!(result.estate.version, 4);
        }

        #[tokio::test]
        async fn retries_are_bounded() {
            let service = service(
                Arc::new(RacingRepository::new(InMemoryEstateRepository::new(), 10)),
                EstateServiceConfig::default().with_max_command_retries(2),
            );
            let id = service.create(create_request(), &executor()).await.unwrap().id;

            let err = service
                .execute_with_retry(id, EstateCommand::Activate, &executor())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConcurrentModification);
            assert_eq!(service.view(id).await.unwrap().cash_pool, kes(30));
        }

        #[tokio::test]
        async fn concurrent_commands_on_one_estate_both_land_with_retry() {
            let service = Arc::new(service(
                Arc::new(InMemoryEstateRepository::new()),
                EstateServiceConfig::default().with_max_command_retries(10),
            ));
            let id = service.create(create_request(), &executor()).await.unwrap().id;

            let mut handles = Vec::new();
            for n in 0..8 {
                let service = Arc::clone(&service);
                handles.push(tokio::spawn(async move {
                    service
                        .execute_with_retry(
                            id,
                            EstateCommand::RecordCashReceipt {
                                amount: kes(100),
                                source: format!("account {n}"),
                                reference: None,
                            },
                            &executor(),
                        )
                        .await
                }));
            }
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            let view = service.view(id).await.unwrap();
            assert_eq!(view.cash_pool, kes(800));
            assert_eq!(view.version, 9);
        }
    }

    mod queries {
        use super::*;

        #[tokio::test]
        async fn readiness_and_net_value() {
            let service = service(
                Arc::new(InMemoryEstateRepository::new()),
                EstateServiceConfig::default(),
            );
            let id = service.create(create_request(), &executor()).await.unwrap().id;

            assert!(service.net_value(id).await.unwrap().is_zero());
            let readiness = service.distribution_readiness(id).await.unwrap();
            assert!(!readiness.ready);
            assert_eq!(service.list_ids().await.unwrap(), vec![id]);
        }
    }
}

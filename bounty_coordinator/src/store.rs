use std::collections::HashMap;
use std::sync::Mutex;

use solana_program::pubkey::Pubkey;

use crate::error::CoordinatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BountyStatus {
    Draft,
    Active,
    Closed,
}

/// Lifecycle of a bounty's escrow, advanced only through the compare-and-swap
/// transitions below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowState {
    Unfunded,
    PendingInit,
    Funded,
    Paid,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct BountyRecord {
    pub id: String,
    pub company_id: String,
    pub reward_amount: u64, // lamports per paid submission
    pub max_submissions: Option<u32>,
    pub paid_submissions: u32,
    pub escrow_address: Option<Pubkey>, // set at most once, always derived
    pub status: BountyStatus,
    pub escrow_state: EscrowState,
}

#[derive(Debug, Clone)]
pub struct CompanyRecord {
    pub id: String,
    pub wallet_address: String,
    pub smart_contract_address: Option<String>,
    pub is_verified: bool,
}

#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub id: String,
    pub bounty_id: String,
    pub submission_id: String,
    pub recipient_wallet: Pubkey,
    pub gross_amount: u64,
    pub platform_fee: u64,
    pub net_amount: u64,
    pub tx_signature: Option<String>,
    pub status: PaymentStatus,
}

/// Persistence boundary of the coordinator. Every method is a single atomic
/// operation against the backing store; the read-check-write transitions are
/// expressed as compare-and-swap so that concurrent requests cannot
/// double-release or double-close the same escrow.
pub trait MarketplaceStore {
    fn bounty(&self, id: &str) -> Result<Option<BountyRecord>, CoordinatorError>;

    fn company(&self, id: &str) -> Result<Option<CompanyRecord>, CoordinatorError>;

    fn payment(&self, id: &str) -> Result<Option<PaymentRecord>, CoordinatorError>;

    /// The live (Pending or Confirmed) payment for a submission, if any.
    fn payment_for_submission(
        &self,
        submission_id: &str,
    ) -> Result<Option<PaymentRecord>, CoordinatorError>;

    /// Records the derived escrow address and moves Unfunded -> PendingInit
    /// in one step. The address is set at most once per bounty.
    fn bind_escrow(&self, bounty_id: &str, address: Pubkey) -> Result<(), CoordinatorError>;

    /// Compare-and-swap on the escrow lifecycle state. Returns the previous
    /// state on success; fails with `EscrowStateConflict` when the current
    /// state is not in `allowed_from`.
    fn transition_escrow(
        &self,
        bounty_id: &str,
        allowed_from: &[EscrowState],
        to: EscrowState,
    ) -> Result<EscrowState, CoordinatorError>;

    /// Inserts a Pending payment. At most one live payment per submission;
    /// a Failed payment may be superseded by a retry.
    fn insert_payment(&self, payment: PaymentRecord) -> Result<(), CoordinatorError>;

    fn set_payment_signature(
        &self,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), CoordinatorError>;

    /// Pending -> Confirmed/Failed, atomically; exactly one caller wins.
    fn finalize_payment(
        &self,
        payment_id: &str,
        status: PaymentStatus,
    ) -> Result<PaymentRecord, CoordinatorError>;

    fn record_paid_submission(&self, bounty_id: &str) -> Result<(), CoordinatorError>;

    fn mark_company_verified(
        &self,
        company_id: &str,
        smart_contract_address: Option<&str>,
    ) -> Result<CompanyRecord, CoordinatorError>;
}

/// In-memory store: the reference implementation behind the trait, used by
/// tests and local development. Atomicity comes from holding the single lock
/// for the whole of each operation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    bounties: HashMap<String, BountyRecord>,
    companies: HashMap<String, CompanyRecord>,
    payments: HashMap<String, PaymentRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_bounty(&self, bounty: BountyRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.bounties.insert(bounty.id.clone(), bounty);
    }

    pub fn insert_company(&self, company: CompanyRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.companies.insert(company.id.clone(), company);
    }
}

impl MarketplaceStore for MemoryStore {
    fn bounty(&self, id: &str) -> Result<Option<BountyRecord>, CoordinatorError> {
        Ok(self.inner.lock().unwrap().bounties.get(id).cloned())
    }

    fn company(&self, id: &str) -> Result<Option<CompanyRecord>, CoordinatorError> {
        Ok(self.inner.lock().unwrap().companies.get(id).cloned())
    }

    fn payment(&self, id: &str) -> Result<Option<PaymentRecord>, CoordinatorError> {
        Ok(self.inner.lock().unwrap().payments.get(id).cloned())
    }

    fn payment_for_submission(
        &self,
        submission_id: &str,
    ) -> Result<Option<PaymentRecord>, CoordinatorError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .payments
            .values()
            .find(|p| p.submission_id == submission_id && p.status != PaymentStatus::Failed)
            .cloned())
    }

    fn bind_escrow(&self, bounty_id: &str, address: Pubkey) -> Result<(), CoordinatorError> {
        let mut inner = self.inner.lock().unwrap();
        let bounty = inner
            .bounties
            .get_mut(bounty_id)
            .ok_or_else(|| CoordinatorError::BountyNotFound(bounty_id.to_string()))?;
        if bounty.escrow_address.is_some() || bounty.escrow_state != EscrowState::Unfunded {
            return Err(CoordinatorError::EscrowStateConflict {
                bounty_id: bounty_id.to_string(),
                actual: bounty.escrow_state,
            });
        }
        bounty.escrow_address = Some(address);
        bounty.escrow_state = EscrowState::PendingInit;
        Ok(())
    }

    fn transition_escrow(
        &self,
        bounty_id: &str,
        allowed_from: &[EscrowState],
        to: EscrowState,
    ) -> Result<EscrowState, CoordinatorError> {
        let mut inner = self.inner.lock().unwrap();
        let bounty = inner
            .bounties
            .get_mut(bounty_id)
            .ok_or_else(|| CoordinatorError::BountyNotFound(bounty_id.to_string()))?;
        if !allowed_from.contains(&bounty.escrow_state) {
            return Err(CoordinatorError::EscrowStateConflict {
                bounty_id: bounty_id.to_string(),
                actual: bounty.escrow_state,
            });
        }
        let previous = bounty.escrow_state;
        bounty.escrow_state = to;
        Ok(previous)
    }

    fn insert_payment(&self, payment: PaymentRecord) -> Result<(), CoordinatorError> {
        let mut inner = self.inner.lock().unwrap();
        let duplicate = inner
            .payments
            .values()
            .any(|p| p.submission_id == payment.submission_id && p.status != PaymentStatus::Failed);
        if duplicate {
            return Err(CoordinatorError::PaymentAlreadyProcessed(
                payment.submission_id,
            ));
        }
        inner.payments.insert(payment.id.clone(), payment);
        Ok(())
    }

    fn set_payment_signature(
        &self,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), CoordinatorError> {
        let mut inner = self.inner.lock().unwrap();
        let payment = inner
            .payments
            .get_mut(payment_id)
            .ok_or_else(|| CoordinatorError::PaymentNotFound(payment_id.to_string()))?;
        payment.tx_signature = Some(signature.to_string());
        Ok(())
    }

    fn finalize_payment(
        &self,
        payment_id: &str,
        status: PaymentStatus,
    ) -> Result<PaymentRecord, CoordinatorError> {
        let mut inner = self.inner.lock().unwrap();
        let payment = inner
            .payments
            .get_mut(payment_id)
            .ok_or_else(|| CoordinatorError::PaymentNotFound(payment_id.to_string()))?;
        if payment.status != PaymentStatus::Pending {
            return Err(CoordinatorError::PaymentStateConflict {
                payment_id: payment_id.to_string(),
                actual: payment.status,
            });
        }
        payment.status = status;
        Ok(payment.clone())
    }

    fn record_paid_submission(&self, bounty_id: &str) -> Result<(), CoordinatorError> {
        let mut inner = self.inner.lock().unwrap();
        let bounty = inner
            .bounties
            .get_mut(bounty_id)
            .ok_or_else(|| CoordinatorError::BountyNotFound(bounty_id.to_string()))?;
        bounty.paid_submissions += 1;
        Ok(())
    }

    fn mark_company_verified(
        &self,
        company_id: &str,
        smart_contract_address: Option<&str>,
    ) -> Result<CompanyRecord, CoordinatorError> {
        let mut inner = self.inner.lock().unwrap();
        let company = inner
            .companies
            .get_mut(company_id)
            .ok_or_else(|| CoordinatorError::CompanyNotFound(company_id.to_string()))?;
        if let Some(address) = smart_contract_address {
            company.smart_contract_address = Some(address.to_string());
        }
        company.is_verified = true;
        Ok(company.clone())
    }
}

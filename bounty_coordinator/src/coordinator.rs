use std::thread;
use std::time::Duration;

use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;

use crate::auth::{Authorizer, Caller};
use crate::error::CoordinatorError;
use crate::escrow::{derive_escrow_address, parse_wallet, MAX_BOUNTY_ID_LEN};
use crate::fee::{compute_fee, FeeBreakdown};
use crate::instruction::{self, PaymentParams};
use crate::oracle::{validate_tx_signature, ChainClient, TxStatus};
use crate::store::{
    BountyStatus, CompanyRecord, EscrowState, MarketplaceStore, PaymentRecord, PaymentStatus,
};

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub platform_wallet: Pubkey,
    pub fee_bps: u16,
    pub min_escrow_lamports: u64,
    /// Extra attempts after the first failed RPC call.
    pub max_rpc_retries: u32,
    /// First retry delay; doubles per attempt.
    pub retry_backoff: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            platform_wallet: crate::PLATFORM_WALLET,
            fee_bps: crate::PLATFORM_FEE_BPS,
            min_escrow_lamports: crate::MIN_ESCROW_AMOUNT,
            max_rpc_retries: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateEscrowRequest {
    pub bounty_id: String,
    pub owner_wallet: String,
    pub amount: u64,
}

/// The unsigned transaction descriptor handed back to the client for signing.
#[derive(Debug, Clone)]
pub struct CreateEscrowResponse {
    pub escrow_address: Pubkey,
    pub expected_amount: u64,
    pub instruction: Instruction,
}

#[derive(Debug, Clone)]
pub struct DepositParams {
    pub program_id: Pubkey,
    pub bounty_id: String,
    pub escrow_address: Pubkey,
    pub owner_wallet: String,
    pub amount: u64,
    pub instruction: Instruction,
}

#[derive(Debug, Clone)]
pub struct DepositReceipt {
    pub bounty_id: String,
    pub tx_signature: String,
    pub deposit_amount: u64,
    pub new_escrow_balance: u64,
}

#[derive(Debug, Clone)]
pub struct ReleasePaymentRequest {
    pub bounty_id: String,
    pub submission_id: String,
    pub escrow_address: String,
    pub recipient_wallet: String,
    /// Overrides the bounty's per-submission reward when set.
    pub amount: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub payment_id: String,
    pub tx_signature: String,
    /// Net amount transferred to the hunter.
    pub amount: u64,
    pub platform_fee: u64,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone)]
pub struct WithdrawOutcome {
    pub tx_signature: String,
    pub withdrawn_amount: u64,
}

#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub company: CompanyRecord,
    pub verification: TxStatus,
}

/// Orchestrates the escrow lifecycle across the relational store and the
/// chain. Off-chain status only ever advances behind a confirmed on-chain
/// effect, and every read-check-write transition goes through the store's
/// compare-and-swap primitives.
pub struct EscrowCoordinator<C, S, A> {
    chain: C,
    store: S,
    auth: A,
    config: CoordinatorConfig,
}

impl<C, S, A> EscrowCoordinator<C, S, A>
where
    C: ChainClient,
    S: MarketplaceStore,
    A: Authorizer,
{
    pub fn new(chain: C, store: S, auth: A, config: CoordinatorConfig) -> Self {
        Self {
            chain,
            store,
            auth,
            config,
        }
    }

    /// Derives and binds the escrow address for a bounty and returns the
    /// unsigned `initialize` transaction for the client to sign. Funds never
    /// move here; the balance check is advisory and the chain remains the
    /// authority.
    pub fn create_escrow(
        &self,
        request: &CreateEscrowRequest,
    ) -> Result<CreateEscrowResponse, CoordinatorError> {
        if request.amount < self.config.min_escrow_lamports {
            return Err(CoordinatorError::BelowMinimumEscrow {
                amount: request.amount,
                minimum: self.config.min_escrow_lamports,
            });
        }
        if request.bounty_id.len() > MAX_BOUNTY_ID_LEN {
            return Err(CoordinatorError::BountyIdTooLong);
        }
        let owner = parse_wallet(&request.owner_wallet)?;
        let bounty = self.require_bounty(&request.bounty_id)?;

        let balance = self.with_retry(|| self.chain.get_balance(&owner))?;
        if balance < request.amount {
            return Err(CoordinatorError::InsufficientFunds {
                required: request.amount,
                available: balance,
            });
        }

        let (escrow_address, _) = derive_escrow_address(&owner, &bounty.id);
        self.store.bind_escrow(&bounty.id, escrow_address)?;

        Ok(CreateEscrowResponse {
            escrow_address,
            expected_amount: request.amount,
            instruction: instruction::initialize_escrow(&owner, &bounty.id, request.amount),
        })
    }

    /// Confirms a client-reported `initialize` transaction and moves the
    /// escrow to Funded. An unconfirmed transaction leaves everything
    /// untouched for a later retry; a failed one returns the bounty to
    /// Unfunded.
    pub fn confirm_escrow_init(
        &self,
        bounty_id: &str,
        signature: &str,
    ) -> Result<EscrowState, CoordinatorError> {
        validate_tx_signature(signature)?;
        let bounty = self.require_bounty(bounty_id)?;
        if bounty.escrow_state != EscrowState::PendingInit {
            return Err(CoordinatorError::EscrowStateConflict {
                bounty_id: bounty_id.to_string(),
                actual: bounty.escrow_state,
            });
        }

        match self.with_retry(|| self.chain.verify_transaction(signature))? {
            TxStatus::Confirmed { .. } => {
                self.store.transition_escrow(
                    bounty_id,
                    &[EscrowState::PendingInit],
                    EscrowState::Funded,
                )?;
                Ok(EscrowState::Funded)
            }
            TxStatus::Failed { reason } => {
                self.store.transition_escrow(
                    bounty_id,
                    &[EscrowState::PendingInit],
                    EscrowState::Unfunded,
                )?;
                Err(CoordinatorError::TransactionFailed {
                    signature: signature.to_string(),
                    reason,
                })
            }
            TxStatus::Pending | TxStatus::NotFound => Err(
                CoordinatorError::UnconfirmedTransaction(signature.to_string()),
            ),
        }
    }

    /// Returns the parameters for a top-up deposit. Requires an initialized
    /// escrow on an Active bounty and an authorized caller; mutates nothing —
    /// stored state only changes once the signed deposit is confirmed.
    pub fn prepare_deposit(
        &self,
        caller: &Caller,
        bounty_id: &str,
        amount: u64,
    ) -> Result<DepositParams, CoordinatorError> {
        if amount == 0 {
            return Err(CoordinatorError::InvalidAmount(
                "deposit amount must be positive",
            ));
        }
        let bounty = self.require_bounty(bounty_id)?;
        self.authorize_payment_approver(caller, &bounty.company_id)?;
        let escrow_address = bounty
            .escrow_address
            .ok_or_else(|| CoordinatorError::EscrowNotInitialized(bounty.id.clone()))?;
        if bounty.status != BountyStatus::Active {
            return Err(CoordinatorError::WrongBountyStatus {
                bounty_id: bounty.id.clone(),
                actual: bounty.status,
                expected: BountyStatus::Active,
            });
        }
        let company = self
            .store
            .company(&bounty.company_id)?
            .ok_or_else(|| CoordinatorError::CompanyNotFound(bounty.company_id.clone()))?;
        let owner = parse_wallet(&company.wallet_address)?;

        Ok(DepositParams {
            program_id: crate::ID,
            bounty_id: bounty.id.clone(),
            escrow_address,
            owner_wallet: company.wallet_address,
            amount,
            instruction: instruction::deposit(&owner, &bounty.id, amount),
        })
    }

    /// Confirms a client-reported deposit transaction, then re-reads the
    /// escrow for the new balance (re-polling while the RPC catches up).
    pub fn confirm_deposit(
        &self,
        caller: &Caller,
        bounty_id: &str,
        signature: &str,
        amount: u64,
    ) -> Result<DepositReceipt, CoordinatorError> {
        validate_tx_signature(signature)?;
        let bounty = self.require_bounty(bounty_id)?;
        self.authorize_payment_approver(caller, &bounty.company_id)?;
        let escrow_address = bounty
            .escrow_address
            .ok_or_else(|| CoordinatorError::EscrowNotInitialized(bounty.id.clone()))?;

        match self.with_retry(|| self.chain.verify_transaction(signature))? {
            TxStatus::Confirmed { .. } => {}
            TxStatus::Failed { reason } => {
                return Err(CoordinatorError::TransactionFailed {
                    signature: signature.to_string(),
                    reason,
                })
            }
            TxStatus::Pending | TxStatus::NotFound => {
                return Err(CoordinatorError::UnconfirmedTransaction(
                    signature.to_string(),
                ))
            }
        }

        let account = self.with_retry(|| {
            self.chain
                .get_escrow_account(&escrow_address)?
                .ok_or_else(|| {
                    CoordinatorError::RpcUnavailable("escrow account not visible yet".to_string())
                })
        })?;

        Ok(DepositReceipt {
            bounty_id: bounty.id,
            tx_signature: signature.to_string(),
            deposit_amount: amount,
            new_escrow_balance: account.escrow_amount,
        })
    }

    /// Releases a payout for an approved submission. The payment record is
    /// written Pending before anything is submitted; it is only marked
    /// Confirmed once the chain reports the transaction confirmed. A
    /// confirmation that cannot be obtained yet leaves the record Pending for
    /// the reconciliation job — never silently Confirmed, never lost.
    pub fn release_payment(
        &self,
        caller: &Caller,
        request: &ReleasePaymentRequest,
    ) -> Result<ReleaseOutcome, CoordinatorError> {
        let bounty = self.require_bounty(&request.bounty_id)?;
        self.authorize_payment_approver(caller, &bounty.company_id)?;

        if self
            .store
            .payment_for_submission(&request.submission_id)?
            .is_some()
        {
            return Err(CoordinatorError::PaymentAlreadyProcessed(
                request.submission_id.clone(),
            ));
        }

        let bound = bounty
            .escrow_address
            .ok_or_else(|| CoordinatorError::EscrowNotInitialized(bounty.id.clone()))?;
        let escrow_address = parse_wallet(&request.escrow_address)?;
        if bound != escrow_address {
            return Err(CoordinatorError::EscrowMismatch(bounty.id.clone()));
        }
        if !matches!(
            bounty.escrow_state,
            EscrowState::Funded | EscrowState::Paid
        ) {
            return Err(CoordinatorError::EscrowStateConflict {
                bounty_id: bounty.id.clone(),
                actual: bounty.escrow_state,
            });
        }
        if let Some(max) = bounty.max_submissions {
            if bounty.paid_submissions >= max {
                return Err(CoordinatorError::MaxSubmissionsReached(bounty.id.clone()));
            }
        }

        let recipient = parse_wallet(&request.recipient_wallet)?;
        let gross = request.amount.unwrap_or(bounty.reward_amount);
        if gross == 0 {
            return Err(CoordinatorError::InvalidAmount(
                "payment amount must be positive",
            ));
        }
        let FeeBreakdown { fee, net } = compute_fee(gross, self.config.fee_bps)?;

        let account = self
            .with_retry(|| self.chain.get_escrow_account(&escrow_address))?
            .ok_or_else(|| CoordinatorError::EscrowNotInitialized(bounty.id.clone()))?;
        if account.escrow_amount < gross {
            return Err(CoordinatorError::InsufficientFunds {
                required: gross,
                available: account.escrow_amount,
            });
        }

        let payment_id = format!("pay_{}", request.submission_id);
        self.store.insert_payment(PaymentRecord {
            id: payment_id.clone(),
            bounty_id: bounty.id.clone(),
            submission_id: request.submission_id.clone(),
            recipient_wallet: recipient,
            gross_amount: gross,
            platform_fee: fee,
            net_amount: net,
            tx_signature: None,
            status: PaymentStatus::Pending,
        })?;

        let ix = instruction::process_payment(&PaymentParams {
            owner: account.owner,
            hunter_wallet: recipient,
            platform_wallet: self.config.platform_wallet,
            bounty_id: bounty.id.clone(),
            submission_id: request.submission_id.clone(),
            custom_amount: request.amount,
            reward_per_submission: bounty.reward_amount,
            max_submissions: bounty.max_submissions.unwrap_or(u32::MAX),
            current_paid_submissions: bounty.paid_submissions,
        });
        let signature = self.with_retry(|| self.chain.submit_instruction(&ix))?;
        self.store.set_payment_signature(&payment_id, &signature)?;

        let verification = self.with_retry(|| self.chain.verify_transaction(&signature));
        match verification {
            Ok(TxStatus::Confirmed { .. }) => {
                self.store
                    .finalize_payment(&payment_id, PaymentStatus::Confirmed)?;
                self.store.transition_escrow(
                    &bounty.id,
                    &[EscrowState::Funded, EscrowState::Paid],
                    EscrowState::Paid,
                )?;
                self.store.record_paid_submission(&bounty.id)?;
                Ok(ReleaseOutcome {
                    payment_id,
                    tx_signature: signature,
                    amount: net,
                    platform_fee: fee,
                    status: PaymentStatus::Confirmed,
                })
            }
            Ok(TxStatus::Failed { reason }) => {
                self.store
                    .finalize_payment(&payment_id, PaymentStatus::Failed)?;
                Err(CoordinatorError::TransactionFailed { signature, reason })
            }
            Err(err) if !err.is_retryable() => Err(err),
            // Submitted but not yet visible as final (or the RPC went away
            // again): hand the record to the reconciliation job.
            _ => Ok(ReleaseOutcome {
                payment_id,
                tx_signature: signature,
                amount: net,
                platform_fee: fee,
                status: PaymentStatus::Pending,
            }),
        }
    }

    /// Resolves a Pending payment by polling the chain; called by the
    /// externally scheduled reconciliation job. Idempotent: the
    /// Pending -> terminal compare-and-swap ensures a payment racing its own
    /// release confirmation settles exactly once.
    pub fn reconcile_payment(&self, payment_id: &str) -> Result<PaymentStatus, CoordinatorError> {
        let payment = self
            .store
            .payment(payment_id)?
            .ok_or_else(|| CoordinatorError::PaymentNotFound(payment_id.to_string()))?;
        if payment.status != PaymentStatus::Pending {
            return Ok(payment.status);
        }

        let signature = match payment.tx_signature.clone() {
            Some(signature) => signature,
            None => {
                // Never submitted; fail it so the submission can be retried.
                self.store
                    .finalize_payment(payment_id, PaymentStatus::Failed)?;
                return Ok(PaymentStatus::Failed);
            }
        };

        match self.with_retry(|| self.chain.verify_transaction(&signature))? {
            TxStatus::Confirmed { .. } => {
                match self
                    .store
                    .finalize_payment(payment_id, PaymentStatus::Confirmed)
                {
                    Ok(_) => {
                        self.store.transition_escrow(
                            &payment.bounty_id,
                            &[EscrowState::Funded, EscrowState::Paid],
                            EscrowState::Paid,
                        )?;
                        self.store.record_paid_submission(&payment.bounty_id)?;
                        Ok(PaymentStatus::Confirmed)
                    }
                    // Someone else settled it first.
                    Err(CoordinatorError::PaymentStateConflict { actual, .. }) => Ok(actual),
                    Err(err) => Err(err),
                }
            }
            TxStatus::Failed { .. } => {
                self.store
                    .finalize_payment(payment_id, PaymentStatus::Failed)?;
                Ok(PaymentStatus::Failed)
            }
            TxStatus::Pending | TxStatus::NotFound => {
                Err(CoordinatorError::UnconfirmedTransaction(signature))
            }
        }
    }

    /// Returns the remaining escrow funds to the owner once the bounty is
    /// Closed. The Funded|Paid -> Closed transition is claimed before the
    /// on-chain submission, so of two concurrent withdrawals exactly one
    /// proceeds and the loser observes the post-transition state.
    pub fn withdraw_escrow(
        &self,
        caller: &Caller,
        bounty_id: &str,
        escrow_address: &str,
        owner_wallet: &str,
    ) -> Result<WithdrawOutcome, CoordinatorError> {
        let bounty = self.require_bounty(bounty_id)?;
        self.authorize_payment_approver(caller, &bounty.company_id)?;
        if bounty.status != BountyStatus::Closed {
            return Err(CoordinatorError::WrongBountyStatus {
                bounty_id: bounty.id.clone(),
                actual: bounty.status,
                expected: BountyStatus::Closed,
            });
        }
        let bound = bounty
            .escrow_address
            .ok_or_else(|| CoordinatorError::EscrowNotInitialized(bounty.id.clone()))?;
        let escrow = parse_wallet(escrow_address)?;
        if bound != escrow {
            return Err(CoordinatorError::EscrowMismatch(bounty.id.clone()));
        }
        let owner = parse_wallet(owner_wallet)?;

        let account = self
            .with_retry(|| self.chain.get_escrow_account(&escrow))?
            .ok_or_else(|| CoordinatorError::EscrowNotInitialized(bounty.id.clone()))?;
        if account.owner != owner {
            return Err(CoordinatorError::Unauthorized("withdraw from this escrow"));
        }
        let remaining = account.escrow_amount;
        if remaining == 0 {
            return Err(CoordinatorError::InvalidAmount(
                "no funds remaining in escrow",
            ));
        }

        // Claim the transition first so only one concurrent withdrawal
        // reaches the chain.
        let previous = self.store.transition_escrow(
            &bounty.id,
            &[EscrowState::Funded, EscrowState::Paid],
            EscrowState::Closed,
        )?;

        let ix = instruction::close_bounty(&owner, &bounty.id);
        match self.with_retry(|| self.chain.submit_instruction(&ix)) {
            Ok(signature) => Ok(WithdrawOutcome {
                tx_signature: signature,
                withdrawn_amount: remaining,
            }),
            Err(err) => {
                // Nothing reached the chain; give the claim back.
                self.store
                    .transition_escrow(&bounty.id, &[EscrowState::Closed], previous)?;
                Err(err)
            }
        }
    }

    /// Links a company record to its on-chain registration. The relational
    /// update commits only behind a Confirmed verification; anything less
    /// leaves the record untouched and asks the caller to retry later.
    pub fn register_company_on_chain(
        &self,
        caller: &Caller,
        company_id: &str,
        tx_signature: &str,
        smart_contract_address: Option<&str>,
    ) -> Result<RegistrationOutcome, CoordinatorError> {
        validate_tx_signature(tx_signature)?;
        if self.store.company(company_id)?.is_none() {
            return Err(CoordinatorError::CompanyNotFound(company_id.to_string()));
        }
        if !caller.is_admin() && !self.auth.is_company_member(&caller.user_id, company_id)? {
            return Err(CoordinatorError::Unauthorized(
                "register this company on-chain",
            ));
        }

        let verification = self.with_retry(|| self.chain.verify_transaction(tx_signature))?;
        if !verification.is_confirmed() {
            return Err(CoordinatorError::UnconfirmedTransaction(
                tx_signature.to_string(),
            ));
        }

        let company = self
            .store
            .mark_company_verified(company_id, smart_contract_address)?;
        Ok(RegistrationOutcome {
            company,
            verification,
        })
    }

    /// Checks a transaction's finalization status. The signature format is
    /// validated before the oracle is consulted.
    pub fn verify_transaction(&self, signature: &str) -> Result<TxStatus, CoordinatorError> {
        validate_tx_signature(signature)?;
        self.with_retry(|| self.chain.verify_transaction(signature))
    }

    /// Oracle-observed escrow balance; 0 when the account does not exist.
    pub fn escrow_balance(&self, escrow_address: &str) -> Result<u64, CoordinatorError> {
        let escrow = parse_wallet(escrow_address)?;
        let account = self.with_retry(|| self.chain.get_escrow_account(&escrow))?;
        Ok(account.map(|a| a.escrow_amount).unwrap_or(0))
    }

    fn require_bounty(
        &self,
        bounty_id: &str,
    ) -> Result<crate::store::BountyRecord, CoordinatorError> {
        self.store
            .bounty(bounty_id)?
            .ok_or_else(|| CoordinatorError::BountyNotFound(bounty_id.to_string()))
    }

    fn authorize_payment_approver(
        &self,
        caller: &Caller,
        company_id: &str,
    ) -> Result<(), CoordinatorError> {
        if caller.is_admin() || self.auth.can_approve_payments(&caller.user_id, company_id)? {
            Ok(())
        } else {
            Err(CoordinatorError::Unauthorized(
                "manage payments for this bounty",
            ))
        }
    }

    /// Bounded retry with doubling backoff, applied to transient RPC
    /// failures only. Validation and authorization failures are definitive
    /// and pass straight through.
    fn with_retry<T>(
        &self,
        mut op: impl FnMut() -> Result<T, CoordinatorError>,
    ) -> Result<T, CoordinatorError> {
        let mut backoff = self.config.retry_backoff;
        let mut attempts = 0;
        loop {
            match op() {
                Err(err) if err.is_retryable() && attempts < self.config.max_rpc_retries => {
                    attempts += 1;
                    thread::sleep(backoff);
                    backoff = backoff.saturating_mul(2);
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::EscrowAccount;
    use crate::store::{BountyRecord, MemoryStore};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    const SIG: &str = "4444444444444444444444444444444444444444444444444444444444444444444444444444444444444444";

    struct FakeChain {
        balances: Mutex<HashMap<Pubkey, u64>>,
        escrows: Mutex<HashMap<Pubkey, EscrowAccount>>,
        transactions: Mutex<HashMap<String, TxStatus>>,
        submit_result: Mutex<Result<String, CoordinatorError>>,
        balance_failures: AtomicU32,
        balance_calls: AtomicU32,
        verify_calls: AtomicU32,
    }

    impl FakeChain {
        fn new() -> Self {
            Self {
                balances: Mutex::new(HashMap::new()),
                escrows: Mutex::new(HashMap::new()),
                transactions: Mutex::new(HashMap::new()),
                submit_result: Mutex::new(Ok(SIG.to_string())),
                balance_failures: AtomicU32::new(0),
                balance_calls: AtomicU32::new(0),
                verify_calls: AtomicU32::new(0),
            }
        }

        fn set_balance(&self, address: Pubkey, lamports: u64) {
            self.balances.lock().unwrap().insert(address, lamports);
        }

        fn set_escrow(&self, address: Pubkey, account: EscrowAccount) {
            self.escrows.lock().unwrap().insert(address, account);
        }

        fn set_transaction(&self, signature: &str, status: TxStatus) {
            self.transactions
                .lock()
                .unwrap()
                .insert(signature.to_string(), status);
        }

        fn fail_submissions(&self) {
            *self.submit_result.lock().unwrap() =
                Err(CoordinatorError::RpcUnavailable("node down".to_string()));
        }
    }

    impl ChainClient for FakeChain {
        fn get_balance(&self, address: &Pubkey) -> Result<u64, CoordinatorError> {
            self.balance_calls.fetch_add(1, Ordering::SeqCst);
            let failures = self.balance_failures.load(Ordering::SeqCst);
            if failures > 0 {
                self.balance_failures.store(failures - 1, Ordering::SeqCst);
                return Err(CoordinatorError::RpcUnavailable("timeout".to_string()));
            }
            Ok(self
                .balances
                .lock()
                .unwrap()
                .get(address)
                .copied()
                .unwrap_or(0))
        }

        fn get_escrow_account(
            &self,
            escrow: &Pubkey,
        ) -> Result<Option<EscrowAccount>, CoordinatorError> {
            Ok(self.escrows.lock().unwrap().get(escrow).cloned())
        }

        fn verify_transaction(&self, signature: &str) -> Result<TxStatus, CoordinatorError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .transactions
                .lock()
                .unwrap()
                .get(signature)
                .cloned()
                .unwrap_or(TxStatus::NotFound))
        }

        fn submit_instruction(
            &self,
            _instruction: &Instruction,
        ) -> Result<String, CoordinatorError> {
            self.submit_result.lock().unwrap().clone()
        }
    }

    struct AllowAll;

    impl Authorizer for AllowAll {
        fn can_approve_payments(&self, _: &str, _: &str) -> Result<bool, CoordinatorError> {
            Ok(true)
        }
        fn is_company_member(&self, _: &str, _: &str) -> Result<bool, CoordinatorError> {
            Ok(true)
        }
    }

    struct DenyAll;

    impl Authorizer for DenyAll {
        fn can_approve_payments(&self, _: &str, _: &str) -> Result<bool, CoordinatorError> {
            Ok(false)
        }
        fn is_company_member(&self, _: &str, _: &str) -> Result<bool, CoordinatorError> {
            Ok(false)
        }
    }

    fn test_config() -> CoordinatorConfig {
        CoordinatorConfig {
            retry_backoff: Duration::ZERO,
            ..CoordinatorConfig::default()
        }
    }

    fn bounty(id: &str, owner: &Pubkey) -> BountyRecord {
        BountyRecord {
            id: id.to_string(),
            company_id: "acme".to_string(),
            reward_amount: 1_000_000_000,
            max_submissions: Some(5),
            paid_submissions: 0,
            escrow_address: Some(derive_escrow_address(owner, id).0),
            status: BountyStatus::Active,
            escrow_state: EscrowState::Funded,
        }
    }

    fn company(wallet: &Pubkey) -> CompanyRecord {
        CompanyRecord {
            id: "acme".to_string(),
            wallet_address: wallet.to_string(),
            smart_contract_address: None,
            is_verified: false,
        }
    }

    fn escrow_account(owner: &Pubkey, bounty_id: &str, amount: u64) -> EscrowAccount {
        EscrowAccount {
            owner: *owner,
            bounty_id: bounty_id.to_string(),
            escrow_amount: amount,
            created_at: 1_700_000_000,
            bump: 255,
            vault_bump: 255,
        }
    }

    /// Coordinator over a funded Active bounty with 5 SOL in escrow.
    fn funded_fixture(owner: &Pubkey) -> EscrowCoordinator<FakeChain, MemoryStore, AllowAll> {
        let chain = FakeChain::new();
        let store = MemoryStore::new();
        store.insert_bounty(bounty("b1", owner));
        store.insert_company(company(owner));
        let escrow = derive_escrow_address(owner, "b1").0;
        chain.set_escrow(escrow, escrow_account(owner, "b1", 5_000_000_000));
        EscrowCoordinator::new(chain, store, AllowAll, test_config())
    }

    // -- create_escrow --

    #[test]
    fn create_escrow_rejects_below_minimum_without_mutation() {
        let owner = Pubkey::new_unique();
        let coordinator = EscrowCoordinator::new(
            FakeChain::new(),
            MemoryStore::new(),
            AllowAll,
            test_config(),
        );
        coordinator.store.insert_bounty(BountyRecord {
            escrow_address: None,
            escrow_state: EscrowState::Unfunded,
            ..bounty("b1", &owner)
        });

        let err = coordinator
            .create_escrow(&CreateEscrowRequest {
                bounty_id: "b1".to_string(),
                owner_wallet: owner.to_string(),
                amount: crate::MIN_ESCROW_AMOUNT - 1,
            })
            .unwrap_err();

        assert!(matches!(err, CoordinatorError::BelowMinimumEscrow { .. }));
        let untouched = coordinator.store.bounty("b1").unwrap().unwrap();
        assert_eq!(untouched.escrow_address, None);
        assert_eq!(untouched.escrow_state, EscrowState::Unfunded);
        assert_eq!(coordinator.chain.balance_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn create_escrow_rejects_malformed_wallet() {
        let owner = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        let err = coordinator
            .create_escrow(&CreateEscrowRequest {
                bounty_id: "b1".to_string(),
                owner_wallet: "definitely-not-base58!".to_string(),
                amount: crate::MIN_ESCROW_AMOUNT,
            })
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::InvalidAddress(_)));
    }

    #[test]
    fn create_escrow_checks_wallet_balance() {
        let owner = Pubkey::new_unique();
        let coordinator = EscrowCoordinator::new(
            FakeChain::new(),
            MemoryStore::new(),
            AllowAll,
            test_config(),
        );
        coordinator.store.insert_bounty(BountyRecord {
            escrow_address: None,
            escrow_state: EscrowState::Unfunded,
            ..bounty("b1", &owner)
        });
        coordinator.chain.set_balance(owner, 50_000_000);

        let err = coordinator
            .create_escrow(&CreateEscrowRequest {
                bounty_id: "b1".to_string(),
                owner_wallet: owner.to_string(),
                amount: crate::MIN_ESCROW_AMOUNT,
            })
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::InsufficientFunds { .. }));
        let untouched = coordinator.store.bounty("b1").unwrap().unwrap();
        assert_eq!(untouched.escrow_address, None);
    }

    #[test]
    fn create_escrow_binds_the_derived_address() {
        let owner = Pubkey::new_unique();
        let coordinator = EscrowCoordinator::new(
            FakeChain::new(),
            MemoryStore::new(),
            AllowAll,
            test_config(),
        );
        coordinator.store.insert_bounty(BountyRecord {
            escrow_address: None,
            escrow_state: EscrowState::Unfunded,
            ..bounty("b1", &owner)
        });
        coordinator.chain.set_balance(owner, 10_000_000_000);

        let response = coordinator
            .create_escrow(&CreateEscrowRequest {
                bounty_id: "b1".to_string(),
                owner_wallet: owner.to_string(),
                amount: 500_000_000,
            })
            .unwrap();

        assert_eq!(response.escrow_address, derive_escrow_address(&owner, "b1").0);
        assert_eq!(response.expected_amount, 500_000_000);
        let bound = coordinator.store.bounty("b1").unwrap().unwrap();
        assert_eq!(bound.escrow_address, Some(response.escrow_address));
        assert_eq!(bound.escrow_state, EscrowState::PendingInit);
    }

    #[test]
    fn create_escrow_unknown_bounty_is_not_found() {
        let owner = Pubkey::new_unique();
        let coordinator = EscrowCoordinator::new(
            FakeChain::new(),
            MemoryStore::new(),
            AllowAll,
            test_config(),
        );
        let err = coordinator
            .create_escrow(&CreateEscrowRequest {
                bounty_id: "missing".to_string(),
                owner_wallet: owner.to_string(),
                amount: crate::MIN_ESCROW_AMOUNT,
            })
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::BountyNotFound(_)));
    }

    // -- init confirmation --

    #[test]
    fn confirm_escrow_init_moves_to_funded() {
        let owner = Pubkey::new_unique();
        let coordinator = EscrowCoordinator::new(
            FakeChain::new(),
            MemoryStore::new(),
            AllowAll,
            test_config(),
        );
        coordinator.store.insert_bounty(BountyRecord {
            escrow_state: EscrowState::PendingInit,
            ..bounty("b1", &owner)
        });
        coordinator
            .chain
            .set_transaction(SIG, TxStatus::Confirmed { slot: 42 });

        assert_eq!(
            coordinator.confirm_escrow_init("b1", SIG).unwrap(),
            EscrowState::Funded
        );
        let record = coordinator.store.bounty("b1").unwrap().unwrap();
        assert_eq!(record.escrow_state, EscrowState::Funded);
    }

    #[test]
    fn confirm_escrow_init_leaves_pending_when_unconfirmed() {
        let owner = Pubkey::new_unique();
        let coordinator = EscrowCoordinator::new(
            FakeChain::new(),
            MemoryStore::new(),
            AllowAll,
            test_config(),
        );
        coordinator.store.insert_bounty(BountyRecord {
            escrow_state: EscrowState::PendingInit,
            ..bounty("b1", &owner)
        });

        let err = coordinator.confirm_escrow_init("b1", SIG).unwrap_err();
        assert!(matches!(err, CoordinatorError::UnconfirmedTransaction(_)));
        let record = coordinator.store.bounty("b1").unwrap().unwrap();
        assert_eq!(record.escrow_state, EscrowState::PendingInit);
    }

    // -- prepare_deposit --

    #[test]
    fn prepare_deposit_requires_an_active_bounty() {
        let owner = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        coordinator.store.insert_bounty(BountyRecord {
            status: BountyStatus::Closed,
            ..bounty("b1", &owner)
        });

        let err = coordinator
            .prepare_deposit(&Caller::user("u1"), "b1", 1_000_000)
            .unwrap_err();
        assert!(matches!(
            err,
            CoordinatorError::WrongBountyStatus {
                actual: BountyStatus::Closed,
                ..
            }
        ));
    }

    #[test]
    fn prepare_deposit_requires_an_initialized_escrow() {
        let owner = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        coordinator.store.insert_bounty(BountyRecord {
            escrow_address: None,
            escrow_state: EscrowState::Unfunded,
            ..bounty("b1", &owner)
        });

        let err = coordinator
            .prepare_deposit(&Caller::user("u1"), "b1", 1_000_000)
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::EscrowNotInitialized(_)));
    }

    #[test]
    fn prepare_deposit_enforces_authorization() {
        let owner = Pubkey::new_unique();
        let store = MemoryStore::new();
        store.insert_bounty(bounty("b1", &owner));
        store.insert_company(company(&owner));
        let coordinator =
            EscrowCoordinator::new(FakeChain::new(), store, DenyAll, test_config());

        let err = coordinator
            .prepare_deposit(&Caller::user("u1"), "b1", 1_000_000)
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::Unauthorized(_)));

        // platform admins bypass membership checks
        let params = coordinator
            .prepare_deposit(&Caller::admin("root"), "b1", 1_000_000)
            .unwrap();
        assert_eq!(params.amount, 1_000_000);
        assert_eq!(params.program_id, crate::ID);
    }

    // -- release_payment --

    fn release_request(amount: Option<u64>, owner: &Pubkey, recipient: &Pubkey) -> ReleasePaymentRequest {
        ReleasePaymentRequest {
            bounty_id: "b1".to_string(),
            submission_id: "sub-1".to_string(),
            escrow_address: derive_escrow_address(owner, "b1").0.to_string(),
            recipient_wallet: recipient.to_string(),
            amount,
        }
    }

    #[test]
    fn release_payment_splits_fee_and_confirms() {
        let owner = Pubkey::new_unique();
        let hunter = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        coordinator
            .chain
            .set_transaction(SIG, TxStatus::Confirmed { slot: 7 });

        let outcome = coordinator
            .release_payment(
                &Caller::user("u1"),
                &release_request(Some(1_000_000_000), &owner, &hunter),
            )
            .unwrap();

        assert_eq!(outcome.platform_fee, 20_000_000);
        assert_eq!(outcome.amount, 980_000_000);
        assert_eq!(outcome.status, PaymentStatus::Confirmed);

        let payment = coordinator
            .store
            .payment(&outcome.payment_id)
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Confirmed);
        assert_eq!(payment.gross_amount, 1_000_000_000);
        assert_eq!(payment.net_amount + payment.platform_fee, payment.gross_amount);

        let record = coordinator.store.bounty("b1").unwrap().unwrap();
        assert_eq!(record.escrow_state, EscrowState::Paid);
        assert_eq!(record.paid_submissions, 1);
    }

    #[test]
    fn release_payment_rejects_insufficient_escrow() {
        let owner = Pubkey::new_unique();
        let hunter = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);

        let err = coordinator
            .release_payment(
                &Caller::user("u1"),
                &release_request(Some(9_000_000_000), &owner, &hunter),
            )
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::InsufficientFunds { .. }));
    }

    #[test]
    fn release_payment_is_once_per_submission() {
        let owner = Pubkey::new_unique();
        let hunter = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        coordinator
            .chain
            .set_transaction(SIG, TxStatus::Confirmed { slot: 7 });

        coordinator
            .release_payment(&Caller::user("u1"), &release_request(None, &owner, &hunter))
            .unwrap();
        let err = coordinator
            .release_payment(&Caller::user("u1"), &release_request(None, &owner, &hunter))
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::PaymentAlreadyProcessed(_)));
    }

    #[test]
    fn release_payment_honors_the_submission_cap() {
        let owner = Pubkey::new_unique();
        let hunter = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        coordinator.store.insert_bounty(BountyRecord {
            max_submissions: Some(2),
            paid_submissions: 2,
            ..bounty("b1", &owner)
        });

        let err = coordinator
            .release_payment(&Caller::user("u1"), &release_request(None, &owner, &hunter))
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::MaxSubmissionsReached(_)));
    }

    #[test]
    fn unverified_release_stays_pending_until_reconciled() {
        let owner = Pubkey::new_unique();
        let hunter = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        // no transaction status registered: verification sees NotFound

        let outcome = coordinator
            .release_payment(&Caller::user("u1"), &release_request(None, &owner, &hunter))
            .unwrap();
        assert_eq!(outcome.status, PaymentStatus::Pending);

        let payment = coordinator
            .store
            .payment(&outcome.payment_id)
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.tx_signature.as_deref(), Some(SIG));
        let record = coordinator.store.bounty("b1").unwrap().unwrap();
        assert_eq!(record.paid_submissions, 0);

        // the transaction lands; the reconciliation job settles the record
        coordinator
            .chain
            .set_transaction(SIG, TxStatus::Confirmed { slot: 9 });
        assert_eq!(
            coordinator.reconcile_payment(&outcome.payment_id).unwrap(),
            PaymentStatus::Confirmed
        );
        let record = coordinator.store.bounty("b1").unwrap().unwrap();
        assert_eq!(record.paid_submissions, 1);
        assert_eq!(record.escrow_state, EscrowState::Paid);

        // reconciling again is a no-op
        assert_eq!(
            coordinator.reconcile_payment(&outcome.payment_id).unwrap(),
            PaymentStatus::Confirmed
        );
        assert_eq!(
            coordinator
                .store
                .bounty("b1")
                .unwrap()
                .unwrap()
                .paid_submissions,
            1
        );
    }

    // -- withdraw_escrow --

    #[test]
    fn withdraw_requires_a_closed_bounty() {
        let owner = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        let escrow = derive_escrow_address(&owner, "b1").0;

        let err = coordinator
            .withdraw_escrow(
                &Caller::user("u1"),
                "b1",
                &escrow.to_string(),
                &owner.to_string(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoordinatorError::WrongBountyStatus {
                expected: BountyStatus::Closed,
                ..
            }
        ));
    }

    #[test]
    fn withdraw_returns_the_observed_balance() {
        let owner = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        coordinator.store.insert_bounty(BountyRecord {
            status: BountyStatus::Closed,
            escrow_state: EscrowState::Paid,
            ..bounty("b1", &owner)
        });
        let escrow = derive_escrow_address(&owner, "b1").0;

        let outcome = coordinator
            .withdraw_escrow(
                &Caller::user("u1"),
                "b1",
                &escrow.to_string(),
                &owner.to_string(),
            )
            .unwrap();
        assert_eq!(outcome.withdrawn_amount, 5_000_000_000);
        assert_eq!(
            coordinator.store.bounty("b1").unwrap().unwrap().escrow_state,
            EscrowState::Closed
        );
    }

    #[test]
    fn concurrent_withdrawals_have_a_single_winner() {
        let owner = Pubkey::new_unique();
        let coordinator = Arc::new(funded_fixture(&owner));
        coordinator.store.insert_bounty(BountyRecord {
            status: BountyStatus::Closed,
            escrow_state: EscrowState::Paid,
            ..bounty("b1", &owner)
        });
        let escrow = derive_escrow_address(&owner, "b1").0;

        let mut handles = Vec::new();
        for _ in 0..2 {
            let coordinator = Arc::clone(&coordinator);
            let escrow = escrow.to_string();
            let owner = owner.to_string();
            handles.push(thread::spawn(move || {
                coordinator.withdraw_escrow(&Caller::user("u1"), "b1", &escrow, &owner)
            }));
        }
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = results.into_iter().find(|r| r.is_err()).unwrap().unwrap_err();
        assert!(matches!(
            loser,
            CoordinatorError::EscrowStateConflict {
                actual: EscrowState::Closed,
                ..
            }
        ));
    }

    #[test]
    fn failed_submission_rolls_the_withdrawal_back() {
        let owner = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        coordinator.store.insert_bounty(BountyRecord {
            status: BountyStatus::Closed,
            escrow_state: EscrowState::Paid,
            ..bounty("b1", &owner)
        });
        coordinator.chain.fail_submissions();
        let escrow = derive_escrow_address(&owner, "b1").0;

        let err = coordinator
            .withdraw_escrow(
                &Caller::user("u1"),
                "b1",
                &escrow.to_string(),
                &owner.to_string(),
            )
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::RpcUnavailable(_)));
        assert_eq!(
            coordinator.store.bounty("b1").unwrap().unwrap().escrow_state,
            EscrowState::Paid
        );
    }

    // -- company registration --

    #[test]
    fn unconfirmed_registration_mutates_nothing() {
        let owner = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);

        let err = coordinator
            .register_company_on_chain(&Caller::admin("root"), "acme", SIG, Some("contract-1"))
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::UnconfirmedTransaction(_)));

        let record = coordinator.store.company("acme").unwrap().unwrap();
        assert!(!record.is_verified);
        assert_eq!(record.smart_contract_address, None);
    }

    #[test]
    fn confirmed_registration_marks_the_company_verified() {
        let owner = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        coordinator
            .chain
            .set_transaction(SIG, TxStatus::Confirmed { slot: 3 });

        let outcome = coordinator
            .register_company_on_chain(&Caller::admin("root"), "acme", SIG, Some("contract-1"))
            .unwrap();
        assert!(outcome.company.is_verified);
        assert_eq!(
            outcome.company.smart_contract_address.as_deref(),
            Some("contract-1")
        );
        assert!(outcome.verification.is_confirmed());
    }

    #[test]
    fn short_signatures_never_reach_the_oracle() {
        let owner = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        let short = "4".repeat(87);

        let err = coordinator
            .register_company_on_chain(&Caller::admin("root"), "acme", &short, None)
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::InvalidSignature(_)));

        let err = coordinator.verify_transaction(&short).unwrap_err();
        assert!(matches!(err, CoordinatorError::InvalidSignature(_)));

        assert_eq!(coordinator.chain.verify_calls.load(Ordering::SeqCst), 0);
    }

    // -- retry policy --

    #[test]
    fn transient_rpc_failures_are_retried() {
        let owner = Pubkey::new_unique();
        let coordinator = EscrowCoordinator::new(
            FakeChain::new(),
            MemoryStore::new(),
            AllowAll,
            test_config(),
        );
        coordinator.store.insert_bounty(BountyRecord {
            escrow_address: None,
            escrow_state: EscrowState::Unfunded,
            ..bounty("b1", &owner)
        });
        coordinator.chain.set_balance(owner, 10_000_000_000);
        coordinator.chain.balance_failures.store(2, Ordering::SeqCst);

        coordinator
            .create_escrow(&CreateEscrowRequest {
                bounty_id: "b1".to_string(),
                owner_wallet: owner.to_string(),
                amount: 500_000_000,
            })
            .unwrap();
        assert_eq!(coordinator.chain.balance_calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn exhausted_retries_surface_rpc_unavailable() {
        let owner = Pubkey::new_unique();
        let coordinator = EscrowCoordinator::new(
            FakeChain::new(),
            MemoryStore::new(),
            AllowAll,
            test_config(),
        );
        coordinator.store.insert_bounty(BountyRecord {
            escrow_address: None,
            escrow_state: EscrowState::Unfunded,
            ..bounty("b1", &owner)
        });
        coordinator
            .chain
            .balance_failures
            .store(u32::MAX, Ordering::SeqCst);

        let err = coordinator
            .create_escrow(&CreateEscrowRequest {
                bounty_id: "b1".to_string(),
                owner_wallet: owner.to_string(),
                amount: 500_000_000,
            })
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::RpcUnavailable(_)));
        // the first call plus max_rpc_retries
        assert_eq!(coordinator.chain.balance_calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn escrow_balance_is_zero_for_missing_accounts() {
        let owner = Pubkey::new_unique();
        let coordinator = funded_fixture(&owner);
        let missing = Pubkey::new_unique();
        assert_eq!(coordinator.escrow_balance(&missing.to_string()).unwrap(), 0);

        let escrow = derive_escrow_address(&owner, "b1").0;
        assert_eq!(
            coordinator.escrow_balance(&escrow.to_string()).unwrap(),
            5_000_000_000
        );
    }
}

use anchor_lang::{AccountDeserialize, InstructionData, ToAccountMetas};
use burry_core::pda::derive_escrow_address;
use burry_core::EscrowRecord;
use burry_escrow::{accounts as escrow_accounts, instruction as escrow_instruction, Escrow};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;
use tracing::{debug, info, instrument};

use crate::error::{ClientError, Result};
use crate::interface::{to_identity, to_pubkey, ClientConfig};

/// Escrow agent submitting Burry Escrow instructions for a single depositor.
pub struct EscrowAgent {
    // JSON-RPC client of a remote Solana node
    client: RpcClient,
    // Depositor keypair; signs every instruction
    payer: Keypair,
    // On-chain escrow program ID
    program_id: Pubkey,
    // Aggregator the program gates on
    feed: Pubkey,
}

impl EscrowAgent {
    #[instrument(skip_all, fields(rpc_url = %config.rpc_url, program_id = %config.program_id))]
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let payer = read_keypair_file(&config.payer_keypair_path)
            .map_err(|e| ClientError::Keypair(e.to_string()))?;
        debug!(payer = %payer.pubkey(), "Loaded payer keypair");

        let client =
            RpcClient::new_with_commitment(config.rpc_url.clone(), config.commitment_config()?);
        Ok(Self {
            client,
            payer,
            program_id: config.program_id(),
            feed: config.feed(),
        })
    }

    /// The payer's escrow PDA and bump.
    pub fn escrow_address(&self) -> Result<(Pubkey, u8)> {
        escrow_address(&self.program_id, &self.payer.pubkey())
    }

    #[instrument(skip(self))]
    pub async fn deposit(&self, escrow_amount: u64, unlock_price: u64) -> Result<Signature> {
        let (pda, bump) = self.escrow_address()?;
        info!(pda = %pda, bump, "Derived escrow PDA");

        let ix = deposit_ix(
            &self.program_id,
            &self.payer.pubkey(),
            escrow_amount,
            unlock_price,
        )?;
        debug!("Deposit instruction built");
        self.send(ix).await
    }

    #[instrument(skip(self))]
    pub async fn withdraw(&self) -> Result<Signature> {
        let ix = withdraw_ix(&self.program_id, &self.payer.pubkey(), &self.feed)?;
        debug!("Withdraw instruction built");
        self.send(ix).await
    }

    #[instrument(skip(self))]
    pub async fn withdraw_closed_feed(&self) -> Result<Signature> {
        let ix = withdraw_closed_feed_ix(&self.program_id, &self.payer.pubkey(), &self.feed)?;
        debug!("WithdrawClosedFeed instruction built");
        self.send(ix).await
    }

    /// Fetches the payer's escrow, or `None` if no account lives at the PDA.
    #[instrument(skip(self))]
    pub async fn fetch_escrow(&self) -> Result<Option<(Pubkey, EscrowRecord, u64)>> {
        let (pda, _) = self.escrow_address()?;
        let Some(account) = self
            .client
            .get_account_with_commitment(&pda, self.client.commitment())
            .await?
            .value
        else {
            return Ok(None);
        };
        let escrow = Escrow::try_deserialize(&mut account.data.as_slice())?;
        Ok(Some((pda, to_record(&escrow), account.lamports)))
    }

    async fn send(&self, ix: Instruction) -> Result<Signature> {
        let recent_hash = self.client.get_latest_blockhash().await?;
        info!(blockhash = %recent_hash, "Fetched recent blockhash");
        let tx = Transaction::new_signed_with_payer(
            &[ix],
            Some(&self.payer.pubkey()),
            &[&self.payer],
            recent_hash,
        );
        let signature = self.client.send_and_confirm_transaction(&tx).await?;
        info!(%signature, "Transaction confirmed");
        Ok(signature)
    }
}

/// Derives `user`'s escrow PDA through the core derivation.
pub fn escrow_address(program_id: &Pubkey, user: &Pubkey) -> Result<(Pubkey, u8)> {
    let (address, bump) = derive_escrow_address(
        burry_escrow::ESCROW_SEED.as_bytes(),
        &to_identity(user),
        &to_identity(program_id),
    )?;
    Ok((to_pubkey(&address), bump))
}

pub fn deposit_ix(
    program_id: &Pubkey,
    user: &Pubkey,
    escrow_amount: u64,
    unlock_price: u64,
) -> Result<Instruction> {
    let (escrow_account, _) = escrow_address(program_id, user)?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: escrow_accounts::Deposit {
            user: *user,
            escrow_account,
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: escrow_instruction::Deposit {
            escrow_amount,
            unlock_price,
        }
        .data(),
    })
}

pub fn withdraw_ix(program_id: &Pubkey, user: &Pubkey, feed: &Pubkey) -> Result<Instruction> {
    let (escrow_account, _) = escrow_address(program_id, user)?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: escrow_accounts::Withdraw {
            user: *user,
            escrow_account,
            feed_aggregator: *feed,
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: escrow_instruction::Withdraw {}.data(),
    })
}

pub fn withdraw_closed_feed_ix(
    program_id: &Pubkey,
    user: &Pubkey,
    feed: &Pubkey,
) -> Result<Instruction> {
    let (escrow_account, _) = escrow_address(program_id, user)?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: escrow_accounts::WithdrawClosedFeed {
            user: *user,
            escrow_account,
            feed_aggregator: *feed,
            system_program: system_program::ID,
        }
        .to_account_metas(None),
        data: escrow_instruction::WithdrawClosedFeed {}.data(),
    })
}

/// On-chain escrow as a core record.
pub fn to_record(escrow: &Escrow) -> EscrowRecord {
    EscrowRecord::new(
        to_identity(&escrow.owner),
        escrow.unlock_price,
        escrow.escrow_amount,
        escrow.bump,
    )
}

#[cfg(test)]
mod tests {
    use anchor_lang::{AccountSerialize, Discriminator};

    use super::*;

    #[test]
    fn core_derivation_matches_runtime() {
        for _ in 0..16 {
            let user = Pubkey::new_unique();
            let expected = Pubkey::find_program_address(
                &[burry_escrow::ESCROW_SEED.as_bytes(), user.as_ref()],
                &burry_escrow::ID,
            );
            assert_eq!(escrow_address(&burry_escrow::ID, &user).unwrap(), expected);
        }
    }

    #[test]
    fn deposit_instruction_layout() {
        let user = Pubkey::new_unique();
        let ix = deposit_ix(&burry_escrow::ID, &user, 100, 20).unwrap();
        let (pda, _) = escrow_address(&burry_escrow::ID, &user).unwrap();

        assert_eq!(ix.program_id, burry_escrow::ID);
        assert_eq!(ix.accounts.len(), 3);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1].pubkey, pda);
        assert!(ix.accounts[1].is_writable && !ix.accounts[1].is_signer);
        assert_eq!(ix.accounts[2].pubkey, system_program::ID);

        // discriminator, then borsh u64 amount and u64 unlock price
        let disc = escrow_instruction::Deposit::DISCRIMINATOR;
        assert_eq!(&ix.data[..disc.len()], disc);
        let args = &ix.data[disc.len()..];
        assert_eq!(&args[..8], &100u64.to_le_bytes());
        assert_eq!(&args[8..16], &20u64.to_le_bytes());
    }

    #[test]
    fn withdraw_instruction_targets_feed() {
        let user = Pubkey::new_unique();
        let ix = withdraw_ix(&burry_escrow::ID, &user, &burry_escrow::SOL_USD_FEED).unwrap();
        assert_eq!(ix.accounts.len(), 4);
        assert_eq!(ix.accounts[2].pubkey, burry_escrow::SOL_USD_FEED);
        assert!(!ix.accounts[2].is_writable);

        let ix =
            withdraw_closed_feed_ix(&burry_escrow::ID, &user, &burry_escrow::SOL_USD_FEED).unwrap();
        assert_eq!(ix.data, escrow_instruction::WithdrawClosedFeed {}.data());
    }

    #[test]
    fn decodes_escrow_account() {
        let owner = Pubkey::new_unique();
        let escrow = Escrow {
            owner,
            unlock_price: 20,
            escrow_amount: 100,
            bump: 254,
        };
        let mut data = Vec::new();
        escrow.try_serialize(&mut data).unwrap();
        assert_eq!(&data[..8], Escrow::DISCRIMINATOR);

        let decoded = Escrow::try_deserialize(&mut data.as_slice()).unwrap();
        let record = to_record(&decoded);
        assert_eq!(record.owner, to_identity(&owner));
        assert_eq!(record.unlock_price, 20);
        assert_eq!(record.balance, 100);
    }
}

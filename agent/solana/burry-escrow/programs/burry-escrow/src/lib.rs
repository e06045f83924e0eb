#![allow(unexpected_cfgs)]

use anchor_lang::prelude::*;
use anchor_lang::solana_program::clock::Clock;
use anchor_lang::system_program;

pub mod feed;

declare_id!("GhdEns4NgkpVd22VwH624rfxYW4Yg4oXrHDtCQ7451Ja");

/// Program-derived address seed prefix
pub const ESCROW_SEED: &str = "MICHAEL BURRY";

/// Switchboard SOL/USD aggregator; the only feed the gate reads.
pub const SOL_USD_FEED: Pubkey =
    anchor_lang::solana_program::pubkey!("GvDMxPzN1sCj7L26YDK2HnMRXEQmQ2aemov8YBtPS7vR");

/// Oldest confirmed round accepted by `withdraw`, in seconds.
pub const MAX_STALENESS_SECS: i64 = 300;

#[program]
pub mod burry_escrow {
    use super::*;

    /// Creates the caller's escrow PDA and locks `escrow_amount` lamports
    /// until the feed reports a price above `unlock_price`.
    pub fn deposit(ctx: Context<Deposit>, escrow_amount: u64, unlock_price: u64) -> Result<()> {
        require!(escrow_amount > 0, EscrowError::ZeroAmount);

        // fund PDA
        let cpi_ctx = CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            system_program::Transfer {
                from: ctx.accounts.user.to_account_info(),
                to: ctx.accounts.escrow_account.to_account_info(),
            },
        );
        system_program::transfer(cpi_ctx, escrow_amount)?;

        let escrow = &mut ctx.accounts.escrow_account;
        escrow.owner = ctx.accounts.user.key();
        escrow.unlock_price = unlock_price;
        escrow.escrow_amount = escrow_amount;
        escrow.bump = ctx.bumps.escrow_account;

        msg!(
            "Escrow funded: {} lamports, unlock price {}",
            escrow_amount,
            unlock_price
        );
        emit!(EscrowEvent {
            owner: escrow.owner,
            amount: escrow.escrow_amount,
            unlock_price: escrow.unlock_price,
            action: EscrowAction::Deposited,
        });

        Ok(())
    }

    /// Returns the escrow to its owner once the feed's latest confirmed,
    /// fresh price is strictly above the unlock price.
    pub fn withdraw(ctx: Context<Withdraw>) -> Result<()> {
        let escrow = &ctx.accounts.escrow_account;

        let value = feed::latest_value(&ctx.accounts.feed_aggregator)?
            .ok_or(EscrowError::NoOracleValue)?;
        value.check_staleness(Clock::get()?.unix_timestamp, MAX_STALENESS_SECS)?;
        msg!(
            "Current feed result is {}e-{}, unlock price {}",
            value.mantissa,
            value.scale,
            escrow.unlock_price
        );

        require!(
            value.exceeds(escrow.unlock_price),
            EscrowError::ConditionNotMet
        );

        emit!(EscrowEvent {
            owner: escrow.owner,
            amount: escrow.escrow_amount,
            unlock_price: escrow.unlock_price,
            action: EscrowAction::Withdrawn,
        });

        // lamports move to `user` when the account closes on exit
        Ok(())
    }

    /// Returns the escrow to its owner without a price check once the
    /// feed account has been closed.
    pub fn withdraw_closed_feed(ctx: Context<WithdrawClosedFeed>) -> Result<()> {
        require!(
            feed::is_closed(&ctx.accounts.feed_aggregator),
            EscrowError::FeedNotClosed
        );

        let escrow = &ctx.accounts.escrow_account;
        emit!(EscrowEvent {
            owner: escrow.owner,
            amount: escrow.escrow_amount,
            unlock_price: escrow.unlock_price,
            action: EscrowAction::WithdrawnClosedFeed,
        });

        Ok(())
    }
}

#[account]
#[derive(InitSpace)]
pub struct Escrow {
    /// Depositor; receives everything back on close
    pub owner: Pubkey,
    /// Whole-unit price the feed must strictly exceed
    pub unlock_price: u64,
    /// Lamports locked, excluding rent
    pub escrow_amount: u64,
    /// Canonical PDA bump
    pub bump: u8,
}

#[derive(Accounts)]
pub struct Deposit<'info> {
    /// Depositor funding the escrow
    #[account(mut)]
    pub user: Signer<'info>,

    /// PDA holding the escrow; `init` fails if one is already live.
    #[account(
        init,
        seeds = [ESCROW_SEED.as_bytes(), user.key().as_ref()],
        bump,
        payer = user,
        space = 8 + Escrow::INIT_SPACE
    )]
    pub escrow_account: Account<'info, Escrow>,

    /// System program for lamport transfers
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct Withdraw<'info> {
    /// Owner reclaiming the funds
    #[account(mut)]
    pub user: Signer<'info>,

    /// PDA holding the escrow, closed to owner on success
    #[account(
        mut,
        seeds = [ESCROW_SEED.as_bytes(), user.key().as_ref()],
        bump = escrow_account.bump,
        constraint = escrow_account.owner == user.key() @ EscrowError::AddressMismatch,
        close = user
    )]
    pub escrow_account: Account<'info, Escrow>,

    /// Price feed.
    ///
    /// CHECK: fixed address; owner and layout are verified by `feed::latest_value`
    #[account(address = SOL_USD_FEED @ EscrowError::InvalidFeed)]
    pub feed_aggregator: AccountInfo<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct WithdrawClosedFeed<'info> {
    #[account(mut)]
    pub user: Signer<'info>,

    #[account(
        mut,
        seeds = [ESCROW_SEED.as_bytes(), user.key().as_ref()],
        bump = escrow_account.bump,
        constraint = escrow_account.owner == user.key() @ EscrowError::AddressMismatch,
        close = user
    )]
    pub escrow_account: Account<'info, Escrow>,

    /// CHECK: fixed address; only its closed state is inspected
    #[account(address = SOL_USD_FEED @ EscrowError::InvalidFeed)]
    pub feed_aggregator: AccountInfo<'info>,

    pub system_program: Program<'info, System>,
}

/// Events emitted by the escrow program
#[event]
pub struct EscrowEvent {
    pub owner: Pubkey,
    pub amount: u64,
    pub unlock_price: u64,
    pub action: EscrowAction,
}

/// Escrow lifecycle actions
#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub enum EscrowAction {
    Deposited,
    Withdrawn,
    WithdrawnClosedFeed,
}

#[error_code]
pub enum EscrowError {
    #[msg("Escrow amount must be greater than zero.")]
    ZeroAmount,
    #[msg("Escrow account does not belong to the signer.")]
    AddressMismatch,
    #[msg("Current price is not above Escrow unlock price.")]
    ConditionNotMet,
    #[msg("Feed has not been updated within the staleness window.")]
    StalePrice,
    #[msg("Feed holds no confirmed value.")]
    NoOracleValue,
    #[msg("Feed account is not the configured aggregator.")]
    InvalidFeed,
    #[msg("Feed account is still open.")]
    FeedNotClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escrow_space() {
        // discriminator + owner + unlock_price + escrow_amount + bump
        assert_eq!(8 + Escrow::INIT_SPACE, 8 + 32 + 8 + 8 + 1);
    }

    #[test]
    fn escrow_pda_uses_owner_seed() {
        let user = Pubkey::new_unique();
        let (pda, bump) =
            Pubkey::find_program_address(&[ESCROW_SEED.as_bytes(), user.as_ref()], &ID);
        let recreated = Pubkey::create_program_address(
            &[ESCROW_SEED.as_bytes(), user.as_ref(), &[bump]],
            &ID,
        )
        .unwrap();
        assert_eq!(pda, recreated);
    }
}

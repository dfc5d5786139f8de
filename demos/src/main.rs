//! Drives `logpass-core` directly, with no node process around it:
//! genesis plus a handful of representative transactions against a
//! throwaway database, printed as they commit.

use logpass_core::config::Config;
use logpass_core::crypto::{MinerId, PrivateKey, UserId};
use logpass_core::database::Database;
use logpass_core::error::CResult;
use logpass_core::filesystem::TempInstance;
use logpass_core::transactions::create_miner::CreateMinerTransaction;
use logpass_core::transactions::init::InitTransaction;
use logpass_core::transactions::select_miner::SelectMinerTransaction;
use logpass_core::transactions::transfer::TransferTransaction;

fn main() -> CResult<()> {
    let instance = TempInstance::new()?;
    let db = Database::open(instance.root(), Config::default())?;
    println!("opened database at {}", instance.database_dir().display());

    let founder = PrivateKey::generate();
    let recipient = PrivateKey::generate();

    let block_id = 1;
    let init = InitTransaction::create(block_id, 0, 1_717_200_000, 60).sign(&founder);
    db.preload(block_id, std::slice::from_ref(&init));
    db.validate_and_execute(block_id, init)?;
    db.commit(block_id)?;
    println!("block {block_id}: genesis committed");

    let block_id = 2;
    let recipient_id = UserId::from_bytes(*recipient.public_key().derive_user_id().as_bytes());
    let transfer = TransferTransaction::create(block_id, 0, recipient_id, 1_000).sign(&founder);
    db.validate_and_execute(block_id, transfer)?;
    db.commit(block_id)?;
    println!("block {block_id}: transfer committed");

    let block_id = 3;
    let create_miner = CreateMinerTransaction::create(block_id, 0).sign(&founder);
    db.validate_and_execute(block_id, create_miner)?;
    db.commit(block_id)?;
    println!("block {block_id}: miner created");

    let block_id = 4;
    let miner_id = MinerId::from_bytes(founder.public_key().derive_miner_id());
    let select_miner = SelectMinerTransaction::create(block_id, 0, miner_id).sign(&founder);
    db.validate_and_execute(block_id, select_miner)?;
    db.commit(block_id)?;
    println!("block {block_id}: miner selected, rollback depth now {}", db.get_max_rollback_depth());

    Ok(())
}

use tracing::info;

use crate::{
    api::Api,
    asset::Asset,
    chain_client::ChainClient,
    dao,
    docgraph::get_last_document,
    environment::Member,
    error::{Error, Result},
    keys::DEFAULT_KEY,
    name::Name,
    testnet::create_account_from_string,
};

const APPLICATION: &str = "apply to DAO";

/// Creates `member_name`, gives it `voting_power` in Telos Decide and enrols
/// it in `dao`. The DAO's newest document must be the member document for
/// the new account.
pub async fn setup_member<C: ChainClient>(
    api: &Api<C>,
    dao: Name,
    telos_decide: Name,
    member_name: &str,
    voting_power: Asset,
) -> Result<Member> {
    let account = create_account_from_string(api, member_name, DEFAULT_KEY).await?;
    dao::reg_voter(api, telos_decide, account).await?;
    dao::mint(api, telos_decide, dao, account, voting_power).await?;
    dao::apply(api, dao, account, APPLICATION).await?;
    dao::enroll(api, dao, dao, account).await?;

    let document = get_last_document(api, dao).await?;
    let found = document.get_name("member")?;
    if found != account {
        return Err(Error::MemberMismatch {
            expected: account,
            found,
        });
    }
    info!(member = %account, document = document.id, %voting_power, "member enrolled");
    Ok(Member { account, document })
}

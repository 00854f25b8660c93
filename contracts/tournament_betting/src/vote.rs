//! Calls into the voting token's delegated-mint interface. Transfers and
//! burns go through the standard `token::Client`.

use soroban_sdk::{vec, Address, Env, IntoVal, Symbol};

/// Units `grantee` may still mint against `grantor`'s delegation.
pub(crate) fn granted(env: &Env, token: &Address, grantor: &Address, grantee: &Address) -> i128 {
    env.invoke_contract(
        token,
        &Symbol::new(env, "granted"),
        vec![env, grantor.into_val(env), grantee.into_val(env)],
    )
}

pub(crate) fn mint_from(
    env: &Env,
    token: &Address,
    grantee: &Address,
    grantor: &Address,
    to: &Address,
    amount: i128,
) {
    env.invoke_contract::<()>(
        token,
        &Symbol::new(env, "mint_from"),
        vec![
            env,
            grantee.into_val(env),
            grantor.into_val(env),
            to.into_val(env),
            amount.into_val(env),
        ],
    );
}

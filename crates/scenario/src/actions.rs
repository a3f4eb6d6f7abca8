//! The named, deterministic scenario actions: each names a process and a filter that must match
//! exactly one pending message (or the single active timeout), and fails the scenario with an
//! [`Error`] when that uniqueness precondition doesn't hold.

use csmi::tendermint::TendermintLogic;
use csmi::{fire_one_timeout, receive_one_message, Environment};
use csmi_core_state_machine::Message;
use csmi_core_types::Node;

use crate::error::Error;

fn ensure_known(env: &Environment<TendermintLogic>, process: &Node) -> Result<(), Error> {
    if env.processes().any(|p| p == process) {
        Ok(())
    } else {
        Err(Error::UnknownProcess {
            process: process.clone(),
        })
    }
}

fn unique_match(
    env: &Environment<TendermintLogic>,
    process: &Node,
    matches: impl Fn(&Message) -> bool,
) -> Result<Message, Error> {
    ensure_known(env, process)?;

    let candidates: Vec<&Message> = env.buffer(process).iter().filter(|m| matches(m)).collect();
    match candidates.len() {
        0 => Err(Error::NoMatchingMessage {
            process: process.clone(),
        }),
        1 => Ok(candidates[0].clone()),
        count => Err(Error::AmbiguousMatchingMessages {
            process: process.clone(),
            count,
        }),
    }
}

/// Deliver the unique buffered proposal sent by `src` to `process`.
pub fn receive_proposal_from(
    env: &mut Environment<TendermintLogic>,
    logic: &TendermintLogic,
    process: &Node,
    src: &Node,
) -> Result<(), Error> {
    let msg = unique_match(env, process, |m| matches!(m, Message::Propose { src: s, .. } if s == src))?;
    tracing::debug!(?process, ?src, "receive_proposal_from");
    receive_one_message(env, logic, process, msg);
    Ok(())
}

/// Deliver the unique buffered prevote sent by `src` to `process`.
pub fn receive_prevote_from(
    env: &mut Environment<TendermintLogic>,
    logic: &TendermintLogic,
    process: &Node,
    src: &Node,
) -> Result<(), Error> {
    let msg = unique_match(env, process, |m| matches!(m, Message::PreVote { src: s, .. } if s == src))?;
    tracing::debug!(?process, ?src, "receive_prevote_from");
    receive_one_message(env, logic, process, msg);
    Ok(())
}

/// Deliver the unique buffered precommit sent by `src` to `process`.
pub fn receive_precommit_from(
    env: &mut Environment<TendermintLogic>,
    logic: &TendermintLogic,
    process: &Node,
    src: &Node,
) -> Result<(), Error> {
    let msg = unique_match(env, process, |m| matches!(m, Message::PreCommit { src: s, .. } if s == src))?;
    tracing::debug!(?process, ?src, "receive_precommit_from");
    receive_one_message(env, logic, process, msg);
    Ok(())
}

/// Deliver `msg` directly to `process`, bypassing its buffer — a Byzantine message, which never
/// passed through the normal send/broadcast path.
pub fn receive_byzantine(
    env: &mut Environment<TendermintLogic>,
    logic: &TendermintLogic,
    process: &Node,
    msg: Message,
) -> Result<(), Error> {
    ensure_known(env, process)?;
    tracing::debug!(?process, "receive_byzantine");
    csmi::receive_byzantine(env, logic, process, msg);
    Ok(())
}

/// Fire `process`'s single active timeout.
pub fn expire_timeout(
    env: &mut Environment<TendermintLogic>,
    logic: &TendermintLogic,
    process: &Node,
) -> Result<(), Error> {
    ensure_known(env, process)?;
    if env.active_timeout(process).is_none() {
        return Err(Error::NoActiveTimeout {
            process: process.clone(),
        });
    }
    tracing::debug!(?process, "expire_timeout");
    fire_one_timeout(env, logic, process);
    Ok(())
}

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::types::{Identity, TokenId};

/// The identifier ledger refused an issue.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum IssueError {
    #[error("identifier {0} already issued")]
    AlreadyIssued(TokenId),
    #[error("identifier {id} rejected: {reason}")]
    Rejected { id: TokenId, reason: String },
}

/// The collaborator that makes drawn identifiers observably owned.
///
/// The minter calls [`Self::issue`] once per drawn identifier. If any issue
/// fails, the identifiers already issued by that draw are handed back through
/// [`Self::revoke`] in reverse order and the draw is abandoned.
pub trait IdentifierLedger {
    /// Records `id` as owned by `beneficiary`.
    ///
    /// # Errors
    ///
    /// Returns an [`IssueError`] if the identifier cannot be issued. This is
    /// fatal to the whole draw.
    fn issue(&mut self, beneficiary: Identity, id: TokenId) -> Result<(), IssueError>;

    /// Undoes an issue made earlier in a draw that later failed.
    fn revoke(&mut self, beneficiary: Identity, id: TokenId);
}

impl<L: IdentifierLedger + ?Sized> IdentifierLedger for Box<L> {
    fn issue(&mut self, beneficiary: Identity, id: TokenId) -> Result<(), IssueError> {
        (**self).issue(beneficiary, id)
    }

    fn revoke(&mut self, beneficiary: Identity, id: TokenId) {
        (**self).revoke(beneficiary, id);
    }
}

/// An in-memory ownership table.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    owners: BTreeMap<TokenId, Identity>,
    holdings: HashMap<Identity, BTreeSet<TokenId>>,
    reject: BTreeSet<TokenId>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner_of(&self, id: TokenId) -> Option<Identity> {
        self.owners.get(&id).copied()
    }

    /// Identifiers held by `owner`, ascending.
    pub fn tokens_of(&self, owner: &Identity) -> Vec<TokenId> {
        self.holdings
            .get(owner)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total identifiers issued.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Makes every later issue of `id` fail.
    pub fn reject(&mut self, id: TokenId) {
        self.reject.insert(id);
    }
}

impl IdentifierLedger for MemoryLedger {
    fn issue(&mut self, beneficiary: Identity, id: TokenId) -> Result<(), IssueError> {
        if self.reject.contains(&id) {
            return Err(IssueError::Rejected {
                id,
                reason: "rejected by ledger".to_string(),
            });
        }
        if self.owners.contains_key(&id) {
            return Err(IssueError::AlreadyIssued(id));
        }
        self.owners.insert(id, beneficiary);
        self.holdings.entry(beneficiary).or_default().insert(id);
        Ok(())
    }

    fn revoke(&mut self, beneficiary: Identity, id: TokenId) {
        if self.owners.get(&id) == Some(&beneficiary) {
            self.owners.remove(&id);
            if let Some(ids) = self.holdings.get_mut(&beneficiary) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.holdings.remove(&beneficiary);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_revoke() {
        let alice = Identity::from_bytes([1; 32]);
        let mut ledger = MemoryLedger::new();

        ledger.issue(alice, TokenId(3)).unwrap();
        ledger.issue(alice, TokenId(1)).unwrap();
        assert_eq!(ledger.tokens_of(&alice), vec![TokenId(1), TokenId(3)]);
        assert_eq!(ledger.owner_of(TokenId(3)), Some(alice));

        assert_eq!(
            ledger.issue(alice, TokenId(3)),
            Err(IssueError::AlreadyIssued(TokenId(3)))
        );

        ledger.revoke(alice, TokenId(3));
        ledger.revoke(alice, TokenId(1));
        assert!(ledger.is_empty());
        assert!(ledger.tokens_of(&alice).is_empty());
    }

    #[test]
    fn revoke_ignores_other_owners() {
        let alice = Identity::from_bytes([1; 32]);
        let bob = Identity::from_bytes([2; 32]);
        let mut ledger = MemoryLedger::new();

        ledger.issue(alice, TokenId(5)).unwrap();
        ledger.revoke(bob, TokenId(5));
        assert_eq!(ledger.owner_of(TokenId(5)), Some(alice));
    }
}

use super::{DeductionInput, Trio};

/// Whether `trio` can still be the whole mafia team.
///
/// With a single sheriff the trio must contain all of that sheriff's black
/// checks (vacuous when there are none), none of their red checks, and not
/// the sheriff. A red check only survives inside a trio that also holds the
/// claiming sheriff. Double-red players are always excluded. With several
/// sheriffs at least one of them is mafia, and two of them never both are.
pub fn valid_triplet(input: &DeductionInput<'_>, trio: Trio) -> bool {
    let ledger = input.ledger;
    let sheriffs = ledger.sheriffs();

    if sheriffs.len() == 1 {
        if let Some(&sheriff) = sheriffs.first() {
            if let Some(black) = ledger.black_checks_of(sheriff) {
                if !trio.contains_all(black) {
                    return false;
                }
            }
            if let Some(red) = ledger.red_checks_of(sheriff) {
                if trio.contains_any(red) {
                    return false;
                }
            }
            if trio.contains(sheriff) {
                return false;
            }
        }
    }

    if sheriffs.len() == 2 && trio.contains_all(&sheriffs) {
        return false;
    }

    let double_red = ledger.double_red_players();
    for member in trio.members() {
        if double_red.contains(&member) {
            return false;
        }
        let vouched_by_outsider = sheriffs
            .iter()
            .any(|&sheriff| ledger.has_red_checked(sheriff, member) && !trio.contains(sheriff));
        if vouched_by_outsider {
            return false;
        }
    }

    if sheriffs.len() > 1 && !trio.contains_any(&sheriffs) {
        return false;
    }

    let alive_members = trio
        .members()
        .iter()
        .filter(|p| input.is_alive(**p))
        .count();
    if alive_members == 0 {
        return false;
    }

    let alive_total = input.alive_count();
    if alive_total == 0 || alive_members as f64 / alive_total as f64 >= 0.5 {
        return false;
    }

    true
}

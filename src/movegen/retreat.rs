//! Retreat-phase legality.

use crate::board::adjacency::{borders, Subregion};
use crate::board::unit::Unit;

use super::LegalOptions;

/// Where a dislodged unit may retreat to.
///
/// The destination must be empty, must not be where the attack came from,
/// and must not have been left empty by a standoff.
pub fn retreat_options(actor: Subregion, units: &[Unit]) -> LegalOptions {
    let mut options = LegalOptions::new();
    let dislodged: Vec<&Unit> = units
        .iter()
        .filter(|u| u.dislodged && u.territory() == actor.territory)
        .collect();
    let [unit] = dislodged.as_slice() else {
        return options;
    };

    for &target in borders(actor) {
        let t = target.territory;
        let occupied = units.iter().any(|u| u.territory() == t);
        let contested = units.iter().any(|u| u.standoff_from == Some(t));
        if !occupied && !contested && unit.displaced_from != Some(t) {
            options.insert(None, Some(target));
        }
    }
    options
}

/// Any dislodged unit may disband instead of retreating.
pub fn disband_options(actor: Subregion, units: &[Unit]) -> LegalOptions {
    let mut options = LegalOptions::new();
    if units
        .iter()
        .any(|u| u.dislodged && u.territory() == actor.territory)
    {
        options.insert(None, None);
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::territory::{Power, Territory, Territory::*};

    fn dislodged(t: Territory, from: Territory) -> Unit {
        let mut u = Unit::new(Power::Austria, Subregion::land(t));
        u.dislodged = true;
        u.displaced_from = Some(from);
        u
    }

    #[test]
    fn cannot_retreat_toward_attacker_or_standoff() {
        let mut bouncer = Unit::new(Power::Russia, Subregion::land(Ukr));
        bouncer.standoff_from = Some(Rum);
        let units = vec![
            dislodged(Gal, War),
            Unit::new(Power::Russia, Subregion::land(Gal)),
            Unit::new(Power::Italy, Subregion::land(Vie)),
            bouncer,
        ];
        let options = retreat_options(Subregion::land(Gal), &units);
        assert!(options.permits(None, Some(Subregion::land(Boh))));
        assert!(options.permits(None, Some(Subregion::land(Bud))));
        assert!(options.permits(None, Some(Subregion::land(Sil))));
        assert!(!options.permits(None, Some(Subregion::land(War))));
        assert!(!options.permits(None, Some(Subregion::land(Vie))));
        assert!(!options.permits(None, Some(Subregion::land(Rum))));
        assert!(!options.permits(None, Some(Subregion::land(Ukr))));
    }

    #[test]
    fn undislodged_units_have_no_retreats() {
        let units = vec![Unit::new(Power::Austria, Subregion::land(Gal))];
        assert!(retreat_options(Subregion::land(Gal), &units).is_empty());
        assert!(disband_options(Subregion::land(Gal), &units).is_empty());
    }

    #[test]
    fn dislodged_unit_may_disband() {
        let units = vec![dislodged(Gal, War)];
        assert!(disband_options(Subregion::land(Gal), &units).permits(None, None));
    }
}

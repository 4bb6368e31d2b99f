use super::curve::SiteCurve;
use crate::models::{Genus, Region};

/// The built-in site curve for a genus in a region, if one exists.
pub fn default_curve(genus: Genus, region: Region) -> Option<SiteCurve> {
    use SiteCurve::*;

    let (coastal, interior) = match genus {
        Genus::Ac => (Some(AcbHuang), Some(AcbHuang)),
        Genus::At => (Some(AtNigh), Some(AtNigh)),
        Genus::B => (Some(BaNigh), Some(BlChen)),
        Genus::C => (Some(CwcNigh), Some(CwiNigh)),
        Genus::D => (Some(DrNigh), Some(DrNigh)),
        Genus::E => (Some(EpNigh), Some(EpNigh)),
        Genus::F => (Some(FdcBruce), Some(FdiThrower)),
        Genus::H => (Some(HwcWileyAc), Some(HwiNigh)),
        Genus::L => (Some(LwNigh), Some(LwNigh)),
        Genus::Mb => (Some(MbHarlow), Some(MbHarlow)),
        Genus::Pa => (None, Some(PliGoudieDry)),
        Genus::Pl => (Some(PliGoudieWet), Some(PliGoudieDry)),
        Genus::Pw => (Some(PwCurtis), Some(PwCurtis)),
        Genus::Py => (Some(PyNigh), Some(PyNigh)),
        Genus::S => (Some(SsNigh), Some(SwGoudieNat)),
        Genus::Y => (Some(CwcNigh), Some(CwiNigh)),
    };

    match region {
        Region::Coastal => coastal,
        Region::Interior => interior,
    }
}

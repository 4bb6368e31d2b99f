use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;

/// Which age an age value is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeType {
    /// Years since germination.
    Total,
    /// Years since the tree reached breast height.
    BreastHeight,
}

impl std::fmt::Display for AgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgeType::Total => write!(f, "total"),
            AgeType::BreastHeight => write!(f, "breast height"),
        }
    }
}

impl std::str::FromStr for AgeType {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "total" | "t" => Ok(AgeType::Total),
            "breast_height" | "breast" | "bh" | "b" => Ok(AgeType::BreastHeight),
            _ => Err(ProjectionError::ParseError(format!("Unknown age type: '{s}'"))),
        }
    }
}

/// How the inverse (height to age) direction of a curve is solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStrategy {
    ClosedForm,
    GenericIterative,
    GrowthIntercept,
}

impl std::fmt::Display for SolveStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStrategy::ClosedForm => write!(f, "closed form"),
            SolveStrategy::GenericIterative => write!(f, "iterative"),
            SolveStrategy::GrowthIntercept => write!(f, "growth intercept"),
        }
    }
}

/// The equation family of a curve together with its coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveForm {
    /// Bruce (1981) coastal Douglas-fir power-exponential form. `x2` holds
    /// the cubic in `si / 30.48` giving the age exponent; `breast_height` is
    /// the height the curve passes through at years to breast height.
    Bruce { x2: [f64; 4], breast_height: f64 },
    /// Wiley (1978) quadratic-in-reciprocal-height form, in feet. Each term
    /// is `c[0] + c[1] * 2500 / (si_ft - 4.5)`.
    Wiley { x2: [f64; 2], x3: [f64; 2], x4: [f64; 2] },
    /// Goudie logistic form on log breast-height age.
    Goudie { x1: f64, x2: f64, x3: f64 },
    /// Hu & Garcia transcendental growth equation.
    HuGarcia(HuGarciaCoefficients),
    /// Chapman-Richards anchored at breast-height age 50, with a
    /// site-dependent shape exponent `b2 * (si - 1.3)^b3`.
    ChapmanRichards { b1: f64, b2: f64, b3: f64 },
    /// Direct site-index relation valid for breast-height ages `1..=max_age`.
    GrowthIntercept { b1: f64, b2: f64, max_age: u32 },
}

impl CurveForm {
    pub fn strategy(&self) -> SolveStrategy {
        match self {
            CurveForm::Bruce { .. }
            | CurveForm::Wiley { .. }
            | CurveForm::Goudie { .. }
            | CurveForm::HuGarcia(_) => SolveStrategy::ClosedForm,
            CurveForm::ChapmanRichards { .. } => SolveStrategy::GenericIterative,
            CurveForm::GrowthIntercept { .. } => SolveStrategy::GrowthIntercept,
        }
    }

    /// The numeric coefficients of the form, in declaration order.
    pub fn coefficients(&self) -> Vec<f64> {
        match *self {
            CurveForm::Bruce { x2, breast_height } => {
                let mut c = x2.to_vec();
                c.push(breast_height);
                c
            }
            CurveForm::Wiley { x2, x3, x4 } => [x2, x3, x4].concat(),
            CurveForm::Goudie { x1, x2, x3 } => vec![x1, x2, x3],
            CurveForm::HuGarcia(c) => vec![c.scale, c.scale_exponent, c.shape, c.exponent],
            CurveForm::ChapmanRichards { b1, b2, b3 } => vec![b1, b2, b3],
            CurveForm::GrowthIntercept { b1, b2, max_age } => vec![b1, b2, max_age as f64],
        }
    }
}

/// Coefficients of the Hu & Garcia equation. The asymptote is
/// `scale * q^scale_exponent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HuGarciaCoefficients {
    pub scale: f64,
    pub scale_exponent: f64,
    pub shape: f64,
    pub exponent: f64,
}

/// Closed-form estimate of years to breast height from site index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YearsToBreastHeightModel {
    /// `13.25 - si / 6.096`
    Bruce,
    /// `a - b * si`
    Linear { a: f64, b: f64 },
    /// `a + b / si`
    Reciprocal { a: f64, b: f64 },
}

/// Species a curve was fitted for. Site-index conversion between curves is
/// defined per species pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveSpecies {
    Acb,
    At,
    Ba,
    Bl,
    Cwc,
    Cwi,
    Dr,
    Ep,
    Fdc,
    Fdi,
    Hwc,
    Hwi,
    Lw,
    Mb,
    Pli,
    Pw,
    Py,
    Ss,
    Sw,
}

impl CurveSpecies {
    pub const ALL: [CurveSpecies; 19] = [
        CurveSpecies::Acb,
        CurveSpecies::At,
        CurveSpecies::Ba,
        CurveSpecies::Bl,
        CurveSpecies::Cwc,
        CurveSpecies::Cwi,
        CurveSpecies::Dr,
        CurveSpecies::Ep,
        CurveSpecies::Fdc,
        CurveSpecies::Fdi,
        CurveSpecies::Hwc,
        CurveSpecies::Hwi,
        CurveSpecies::Lw,
        CurveSpecies::Mb,
        CurveSpecies::Pli,
        CurveSpecies::Pw,
        CurveSpecies::Py,
        CurveSpecies::Ss,
        CurveSpecies::Sw,
    ];

    pub fn code(self) -> &'static str {
        match self {
            CurveSpecies::Acb => "ACB",
            CurveSpecies::At => "AT",
            CurveSpecies::Ba => "BA",
            CurveSpecies::Bl => "BL",
            CurveSpecies::Cwc => "CWC",
            CurveSpecies::Cwi => "CWI",
            CurveSpecies::Dr => "DR",
            CurveSpecies::Ep => "EP",
            CurveSpecies::Fdc => "FDC",
            CurveSpecies::Fdi => "FDI",
            CurveSpecies::Hwc => "HWC",
            CurveSpecies::Hwi => "HWI",
            CurveSpecies::Lw => "LW",
            CurveSpecies::Mb => "MB",
            CurveSpecies::Pli => "PLI",
            CurveSpecies::Pw => "PW",
            CurveSpecies::Py => "PY",
            CurveSpecies::Ss => "SS",
            CurveSpecies::Sw => "SW",
        }
    }
}

impl std::fmt::Display for CurveSpecies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for CurveSpecies {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        CurveSpecies::ALL
            .iter()
            .copied()
            .find(|sp| sp.code() == upper)
            .ok_or_else(|| ProjectionError::InvalidSpecies(s.to_string()))
    }
}

/// Identifies one site-curve equation system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SiteCurve {
    AcbHuang,
    BlChen,
    BlThrowerGi,
    CwcKurucz,
    CwcBarker,
    DrNigh,
    FdcNighGi,
    FdcBruce,
    FdiNighGi,
    FdiThrower,
    HwcNighGi,
    HwcWiley,
    HwiNigh,
    HwiNighGi,
    PliNighGi97,
    PliGoudieDry,
    PliGoudieWet,
    SsNighGi,
    SsNigh,
    SsGoudie,
    SwNighGi,
    SwGoudiePla,
    SwGoudieNat,
    HwcNighGi99,
    SsNighGi99,
    SwNighGi99,
    LwNighGi,
    CwiNighGi,
    CwiNigh,
    LwNigh,
    MbHarlow,
    PwCurtis,
    PyNigh,
    AtNigh,
    HwcWileyAc,
    BaNigh,
    SwHuGarcia,
    CwcNigh,
    EpNigh,
}

/// Registry entry for one curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquationSpec {
    pub curve: SiteCurve,
    /// Stable numeric identifier used in input files.
    pub index: u32,
    pub name: &'static str,
    pub species: CurveSpecies,
    pub description: &'static str,
    pub form: CurveForm,
    pub years_to_breast_height: YearsToBreastHeightModel,
}

impl EquationSpec {
    pub fn strategy(&self) -> SolveStrategy {
        self.form.strategy()
    }
}

const BRUCE: CurveForm = CurveForm::Bruce {
    x2: [-0.477762, -0.894427, 0.793548, -0.171666],
    breast_height: 1.372,
};

const WILEY: CurveForm = CurveForm::Wiley {
    x2: [-1.7307, 0.1394],
    x3: [-0.0616, 0.0137],
    x4: [0.00192428, 0.00007024],
};

const HU_GARCIA: CurveForm = CurveForm::HuGarcia(HuGarciaCoefficients {
    scale: 283.9,
    scale_exponent: 0.5137,
    shape: 0.5829,
    exponent: 1.71556,
});

const fn linear(a: f64, b: f64) -> YearsToBreastHeightModel {
    YearsToBreastHeightModel::Linear { a, b }
}

const fn reciprocal(a: f64, b: f64) -> YearsToBreastHeightModel {
    YearsToBreastHeightModel::Reciprocal { a, b }
}

const fn chapman(b1: f64, b2: f64, b3: f64) -> CurveForm {
    CurveForm::ChapmanRichards { b1, b2, b3 }
}

const fn gi(b1: f64, b2: f64) -> CurveForm {
    CurveForm::GrowthIntercept { b1, b2, max_age: 50 }
}

impl SiteCurve {
    pub const ALL: [SiteCurve; 39] = [
        SiteCurve::AcbHuang,
        SiteCurve::BlChen,
        SiteCurve::BlThrowerGi,
        SiteCurve::CwcKurucz,
        SiteCurve::CwcBarker,
        SiteCurve::DrNigh,
        SiteCurve::FdcNighGi,
        SiteCurve::FdcBruce,
        SiteCurve::FdiNighGi,
        SiteCurve::FdiThrower,
        SiteCurve::HwcNighGi,
        SiteCurve::HwcWiley,
        SiteCurve::HwiNigh,
        SiteCurve::HwiNighGi,
        SiteCurve::PliNighGi97,
        SiteCurve::PliGoudieDry,
        SiteCurve::PliGoudieWet,
        SiteCurve::SsNighGi,
        SiteCurve::SsNigh,
        SiteCurve::SsGoudie,
        SiteCurve::SwNighGi,
        SiteCurve::SwGoudiePla,
        SiteCurve::SwGoudieNat,
        SiteCurve::HwcNighGi99,
        SiteCurve::SsNighGi99,
        SiteCurve::SwNighGi99,
        SiteCurve::LwNighGi,
        SiteCurve::CwiNighGi,
        SiteCurve::CwiNigh,
        SiteCurve::LwNigh,
        SiteCurve::MbHarlow,
        SiteCurve::PwCurtis,
        SiteCurve::PyNigh,
        SiteCurve::AtNigh,
        SiteCurve::HwcWileyAc,
        SiteCurve::BaNigh,
        SiteCurve::SwHuGarcia,
        SiteCurve::CwcNigh,
        SiteCurve::EpNigh,
    ];

    /// The registry entry for this curve.
    #[rustfmt::skip]
    pub fn spec(self) -> EquationSpec {
        use CurveSpecies as Sp;
        use SiteCurve::*;

        let (index, name, species, description, form, y2bh) = match self {
            AcbHuang => (1, "acb_huang", Sp::Acb, "Black cottonwood (Huang)", chapman(0.0295, 1.32, -0.08), reciprocal(1.2, 60.0)),
            BlChen => (6, "bl_chen", Sp::Bl, "Subalpine fir (Chen)", chapman(0.0182, 1.45, -0.12), reciprocal(4.2, 95.0)),
            BlThrowerGi => (9, "bl_thrower_gi", Sp::Bl, "Subalpine fir growth intercept (Thrower)", gi(0.0214, 1.18), reciprocal(4.2, 95.0)),
            CwcKurucz => (11, "cwc_kurucz", Sp::Cwc, "Coastal western redcedar (Kurucz)", chapman(0.0231, 1.28, -0.06), linear(11.5, 0.18)),
            CwcBarker => (12, "cwc_barker", Sp::Cwc, "Coastal western redcedar (Barker)", chapman(0.0248, 1.22, -0.05), linear(11.0, 0.17)),
            DrNigh => (13, "dr_nigh", Sp::Dr, "Red alder (Nigh)", chapman(0.0420, 1.10, -0.04), reciprocal(0.8, 35.0)),
            FdcNighGi => (15, "fdc_nigh_gi", Sp::Fdc, "Coastal Douglas-fir growth intercept (Nigh)", gi(0.0256, 1.21), linear(13.25, 0.164)),
            FdcBruce => (16, "fdc_bruce", Sp::Fdc, "Coastal Douglas-fir (Bruce 1981)", BRUCE, YearsToBreastHeightModel::Bruce),
            FdiNighGi => (19, "fdi_nigh_gi", Sp::Fdi, "Interior Douglas-fir growth intercept (Nigh)", gi(0.0233, 1.24), reciprocal(3.9, 72.0)),
            FdiThrower => (20, "fdi_thrower", Sp::Fdi, "Interior Douglas-fir (Thrower)", chapman(0.0219, 1.38, -0.09), reciprocal(3.9, 72.0)),
            HwcNighGi => (31, "hwc_nigh_gi", Sp::Hwc, "Coastal western hemlock growth intercept (Nigh)", gi(0.0271, 1.16), linear(9.43, 0.14108)),
            HwcWiley => (34, "hwc_wiley", Sp::Hwc, "Coastal western hemlock (Wiley 1978)", WILEY, linear(9.43, 0.14108)),
            HwiNigh => (37, "hwi_nigh", Sp::Hwi, "Interior western hemlock (Nigh)", chapman(0.0205, 1.36, -0.07), reciprocal(3.6, 80.0)),
            HwiNighGi => (38, "hwi_nigh_gi", Sp::Hwi, "Interior western hemlock growth intercept (Nigh)", gi(0.0209, 1.19), reciprocal(3.6, 80.0)),
            PliNighGi97 => (42, "pli_nigh_gi97", Sp::Pli, "Lodgepole pine growth intercept (Nigh 1997)", gi(0.0312, 1.14), reciprocal(3.5, 42.64)),
            PliGoudieDry => (48, "pli_goudie_dry", Sp::Pli, "Lodgepole pine, dry sites (Goudie)", CurveForm::Goudie { x1: -1.00726, x2: 7.81498, x3: -1.28517 }, reciprocal(3.5, 42.64)),
            PliGoudieWet => (49, "pli_goudie_wet", Sp::Pli, "Lodgepole pine, wet sites (Goudie)", CurveForm::Goudie { x1: -0.935, x2: 7.81498, x3: -1.28517 }, reciprocal(3.5, 42.64)),
            SsNighGi => (58, "ss_nigh_gi", Sp::Ss, "Sitka spruce growth intercept (Nigh)", gi(0.0244, 1.20), linear(10.5, 0.16)),
            SsNigh => (59, "ss_nigh", Sp::Ss, "Sitka spruce (Nigh)", chapman(0.0226, 1.31, -0.07), linear(10.5, 0.16)),
            SsGoudie => (60, "ss_goudie", Sp::Ss, "Sitka spruce (Goudie)", CurveForm::Goudie { x1: -1.5282, x2: 11.0605, x3: -1.5108 }, linear(10.5, 0.16)),
            SwNighGi => (63, "sw_nigh_gi", Sp::Sw, "White spruce growth intercept (Nigh)", gi(0.0198, 1.25), reciprocal(4.0, 85.0)),
            SwGoudiePla => (70, "sw_goudie_pla", Sp::Sw, "White spruce plantations (Goudie)", CurveForm::Goudie { x1: -1.2866, x2: 9.7936, x3: -1.4661 }, reciprocal(2.5, 60.0)),
            SwGoudieNat => (71, "sw_goudie_nat", Sp::Sw, "White spruce natural stands (Goudie)", CurveForm::Goudie { x1: -1.2866, x2: 9.7936, x3: -1.4661 }, reciprocal(4.0, 85.0)),
            HwcNighGi99 => (79, "hwc_nigh_gi99", Sp::Hwc, "Coastal western hemlock growth intercept (Nigh 1999)", gi(0.0265, 1.17), linear(9.43, 0.14108)),
            SsNighGi99 => (80, "ss_nigh_gi99", Sp::Ss, "Sitka spruce growth intercept (Nigh 1999)", gi(0.0239, 1.22), linear(10.5, 0.16)),
            SwNighGi99 => (81, "sw_nigh_gi99", Sp::Sw, "White spruce growth intercept (Nigh 1999)", gi(0.0203, 1.26), reciprocal(4.0, 85.0)),
            LwNighGi => (82, "lw_nigh_gi", Sp::Lw, "Western larch growth intercept (Nigh)", gi(0.0288, 1.15), reciprocal(2.8, 48.0)),
            CwiNighGi => (84, "cwi_nigh_gi", Sp::Cwi, "Interior western redcedar growth intercept (Nigh)", gi(0.0187, 1.23), reciprocal(4.6, 98.0)),
            CwiNigh => (86, "cwi_nigh", Sp::Cwi, "Interior western redcedar (Nigh)", chapman(0.0193, 1.40, -0.10), reciprocal(4.6, 98.0)),
            LwNigh => (87, "lw_nigh", Sp::Lw, "Western larch (Nigh)", chapman(0.0301, 1.26, -0.06), reciprocal(2.8, 48.0)),
            MbHarlow => (88, "mb_harlow", Sp::Mb, "Bigleaf maple (Harlow)", chapman(0.0385, 1.12, -0.03), reciprocal(1.0, 40.0)),
            PwCurtis => (89, "pw_curtis", Sp::Pw, "Western white pine (Curtis)", chapman(0.0214, 1.34, -0.08), reciprocal(3.8, 78.0)),
            PyNigh => (90, "py_nigh", Sp::Py, "Ponderosa pine (Nigh)", chapman(0.0176, 1.42, -0.11), reciprocal(5.0, 90.0)),
            AtNigh => (92, "at_nigh", Sp::At, "Trembling aspen (Nigh)", chapman(0.0352, 1.16, -0.05), reciprocal(1.0, 38.0)),
            HwcWileyAc => (99, "hwc_wiley_ac", Sp::Hwc, "Coastal western hemlock, managed stands (Wiley)", chapman(0.0262, 1.24, -0.06), linear(9.43, 0.14108)),
            BaNigh => (118, "ba_nigh", Sp::Ba, "Amabilis fir (Nigh)", chapman(0.0197, 1.39, -0.09), linear(14.0, 0.20)),
            SwHuGarcia => (119, "sw_hu_garcia", Sp::Sw, "White spruce (Hu & Garcia)", HU_GARCIA, reciprocal(4.0, 85.0)),
            CwcNigh => (122, "cwc_nigh", Sp::Cwc, "Coastal western redcedar (Nigh)", chapman(0.0238, 1.27, -0.06), linear(11.5, 0.18)),
            EpNigh => (123, "ep_nigh", Sp::Ep, "Paper birch (Nigh)", chapman(0.0398, 1.09, -0.04), reciprocal(1.1, 42.0)),
        };

        EquationSpec {
            curve: self,
            index,
            name,
            species,
            description,
            form,
            years_to_breast_height: y2bh,
        }
    }

    pub fn index(self) -> u32 {
        self.spec().index
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn species(self) -> CurveSpecies {
        self.spec().species
    }

    pub fn strategy(self) -> SolveStrategy {
        self.spec().strategy()
    }

    pub fn is_growth_intercept(self) -> bool {
        self.strategy() == SolveStrategy::GrowthIntercept
    }
}

impl std::fmt::Display for SiteCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let spec = self.spec();
        write!(f, "{} ({})", spec.name, spec.index)
    }
}

impl std::str::FromStr for SiteCurve {
    type Err = ProjectionError;

    /// Accepts either a curve name or its numeric index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let spec = match trimmed.parse::<u32>() {
            Ok(index) => EquationRegistry::lookup(index)?,
            Err(_) => EquationRegistry::by_name(trimmed)?,
        };
        Ok(spec.curve)
    }
}

impl TryFrom<String> for SiteCurve {
    type Error = ProjectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SiteCurve> for String {
    fn from(curve: SiteCurve) -> Self {
        curve.name().to_string()
    }
}

/// Read-only catalogue of every known curve.
pub struct EquationRegistry;

impl EquationRegistry {
    /// Look a curve up by its numeric index.
    pub fn lookup(index: u32) -> Result<EquationSpec, ProjectionError> {
        Self::all()
            .find(|spec| spec.index == index)
            .ok_or_else(|| ProjectionError::UnknownCurve(index.to_string()))
    }

    /// Look a curve up by name, ignoring case and treating `-` as `_`.
    pub fn by_name(name: &str) -> Result<EquationSpec, ProjectionError> {
        let wanted = name.trim().to_lowercase().replace('-', "_");
        Self::all()
            .find(|spec| spec.name == wanted)
            .ok_or_else(|| ProjectionError::UnknownCurve(name.to_string()))
    }

    pub fn all() -> impl Iterator<Item = EquationSpec> {
        SiteCurve::ALL.into_iter().map(SiteCurve::spec)
    }
}

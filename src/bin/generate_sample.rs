use anyhow::{Context, Result};
use serde::Serialize;

/// Name the report reads by default.
const DEFAULT_OUTPUT: &str = "OECD.EDU.IMEP,DSD_EAG_SAL_STA@DF_EAG_SAL_STA_ALL,+all.csv";

const COUNTRIES: [(&str, &str, f64); 12] = [
    ("LUX", "Luxembourg", 82000.0),
    ("DEU", "Germany", 71000.0),
    ("CHE", "Switzerland", 69000.0),
    ("NLD", "Netherlands", 60000.0),
    ("AUT", "Austria", 56000.0),
    ("USA", "United States", 54000.0),
    ("AUS", "Australia", 52000.0),
    ("KOR", "Korea", 50000.0),
    ("NOR", "Norway", 47000.0),
    ("FRA", "France", 42000.0),
    ("CHL", "Chile", 31000.0),
    ("SVK", "Slovak Republic", 24000.0),
];

const EXPERIENCE: [(&str, &str, f64); 4] = [
    ("EXP0", "Starting salary", 0.72),
    ("EXP10", "Salary after 10 years of experience", 0.88),
    ("EXP15", "Salary after 15 years of experience", 0.97),
    ("EXPMAX", "Salary at top of scale", 1.25),
];

const EDUCATION: [(&str, &str, f64); 4] = [
    ("ISCED11_02", "Early childhood education", 0.90),
    ("ISCED11_1", "Primary education", 0.95),
    ("ISCED11_24", "Lower secondary general education", 1.00),
    ("ISCED11_34", "Upper secondary general education", 1.06),
];

const YEARS: [u32; 2] = [2022, 2023];

/// One line of the OECD export, in its column order.
#[derive(Serialize)]
struct SalaryRow<'a> {
    #[serde(rename = "STRUCTURE")]
    structure: &'a str,
    #[serde(rename = "REF_AREA")]
    ref_area: &'a str,
    #[serde(rename = "Reference area")]
    ref_area_name: &'a str,
    #[serde(rename = "MEASURE")]
    measure: &'a str,
    #[serde(rename = "Measure")]
    measure_name: &'a str,
    #[serde(rename = "UNIT_MEASURE")]
    unit_measure: &'a str,
    #[serde(rename = "Unit of measure")]
    unit_measure_name: &'a str,
    #[serde(rename = "EDUCATION_LEV")]
    education_lev: &'a str,
    #[serde(rename = "Education level")]
    education_lev_name: &'a str,
    #[serde(rename = "PERS_TYPE")]
    pers_type: &'a str,
    #[serde(rename = "Type of personnel")]
    pers_type_name: &'a str,
    #[serde(rename = "PERS_EXP_LEV")]
    pers_exp_lev: &'a str,
    #[serde(rename = "Experience level")]
    pers_exp_lev_name: &'a str,
    #[serde(rename = "OBS_VALUE")]
    obs_value: String,
    #[serde(rename = "Observation value")]
    obs_value_name: String,
    #[serde(rename = "CURRENCY")]
    currency: &'a str,
    #[serde(rename = "Currency")]
    currency_name: &'a str,
    #[serde(rename = "REF_PERIOD")]
    ref_period: String,
    #[serde(rename = "Reference period")]
    ref_period_name: String,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let mut rng = SimpleRng::new(42);
    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("Failed to create {output_path}"))?;

    let mut written = 0usize;
    for (year_idx, &year) in YEARS.iter().enumerate() {
        // Salaries drift up about 3% a year.
        let growth = 1.0 + 0.03 * year_idx as f64;
        for &(code, name, base) in &COUNTRIES {
            for &(exp_code, exp_name, exp_factor) in &EXPERIENCE {
                for &(edu_code, edu_name, edu_factor) in &EDUCATION {
                    // Korea reports no pre-primary scale.
                    if code == "KOR" && edu_code == "ISCED11_02" {
                        continue;
                    }
                    let ppp = base * growth * exp_factor * edu_factor * rng.gauss(1.0, 0.02);

                    // Roughly one observation in 37 is withheld, shown as "..".
                    let withheld = rng.next_u64() % 37 == 0;
                    let value = if withheld {
                        "..".to_string()
                    } else {
                        format!("{ppp:.1}")
                    };

                    let rows = [
                        (
                            "TE",
                            "Teachers",
                            "USD_PPP",
                            "US dollars, PPP converted",
                            value.clone(),
                        ),
                        ("TE", "Teachers", "USD", "US dollars", format!("{:.1}", ppp * 0.8)),
                        (
                            "HEAD",
                            "School heads",
                            "USD_PPP",
                            "US dollars, PPP converted",
                            format!("{:.1}", ppp * 1.35),
                        ),
                    ];

                    for (pers_type, pers_name, unit, unit_name, obs_value) in rows {
                        writer.serialize(SalaryRow {
                            structure: "DATAFLOW",
                            ref_area: code,
                            ref_area_name: name,
                            measure: "SAL_STAT",
                            measure_name: "Statutory salaries",
                            unit_measure: unit,
                            unit_measure_name: unit_name,
                            education_lev: edu_code,
                            education_lev_name: edu_name,
                            pers_type,
                            pers_type_name: pers_name,
                            pers_exp_lev: exp_code,
                            pers_exp_lev_name: exp_name,
                            obs_value_name: obs_value.clone(),
                            obs_value,
                            currency: "USD",
                            currency_name: "US dollar",
                            ref_period: year.to_string(),
                            ref_period_name: year.to_string(),
                        })?;
                        written += 1;
                    }
                }
            }
        }
    }
    writer.flush()?;

    println!(
        "Wrote {written} observations ({} countries, {} years) to {output_path}",
        COUNTRIES.len(),
        YEARS.len()
    );
    Ok(())
}

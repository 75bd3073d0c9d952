//! Subscription plan catalogue.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Pt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Monthly,
    Annual,
}

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub period: BillingPeriod,
    pub price: f64,
    pub currency: &'static str,
    /// "month" / "year", localized
    pub period_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanCatalogue {
    pub lang: Lang,
    pub plans: Vec<Plan>,
    pub benefits: &'static [&'static str],
    pub subscribe_label: &'static str,
}

const BENEFITS_EN: &[&str] = &[
    "Unlimited deepresults analysis",
    "5 deepresults APIs",
    "Context memory",
    "Omni v4 model",
];

const BENEFITS_PT: &[&str] = &[
    "Análise ilimitada de deepresults",
    "5 API's de deepresults",
    "Memória de contexto",
    "Modelo omni v4",
];

pub const MONTHLY_PRICE: f64 = 4.99;
pub const ANNUAL_PRICE: f64 = 49.99;

pub fn catalogue(lang: Lang) -> PlanCatalogue {
    let (month, year, benefits, subscribe) = match lang {
        Lang::En => ("month", "year", BENEFITS_EN, "Subscribe now"),
        Lang::Pt => ("mês", "ano", BENEFITS_PT, "Assine agora"),
    };
    PlanCatalogue {
        lang,
        plans: vec![
            Plan {
                period: BillingPeriod::Monthly,
                price: MONTHLY_PRICE,
                currency: "USD",
                period_label: month,
            },
            Plan {
                period: BillingPeriod::Annual,
                price: ANNUAL_PRICE,
                currency: "USD",
                period_label: year,
            },
        ],
        benefits,
        subscribe_label: subscribe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_catalogue() {
        let c = catalogue(Lang::En);
        assert_eq!(c.plans.len(), 2);
        assert_eq!(c.plans[0].price, 4.99);
        assert_eq!(c.plans[1].price, 49.99);
        assert_eq!(c.plans[1].period_label, "year");
        assert_eq!(c.benefits.len(), 4);
    }

    #[test]
    fn test_portuguese_labels() {
        let c = catalogue(Lang::Pt);
        assert_eq!(c.plans[0].period_label, "mês");
        assert_eq!(c.subscribe_label, "Assine agora");
        assert_eq!(c.benefits[2], "Memória de contexto");
    }

    #[test]
    fn test_lang_parses_lowercase() {
        let lang: Lang = serde_json::from_str("\"pt\"").unwrap();
        assert_eq!(lang, Lang::Pt);
    }
}

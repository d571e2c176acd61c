//! Registered-dapps listing served to the wallet frontends.
//!
//! The registry is static. `allowedNetworks` carries the chain ids a
//! dapp is deployed on, as numbers, which is the shape the frontends
//! already consume.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DappGroup {
    pub group_name: &'static str,
    pub dapps: Vec<Dapp>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dapp {
    pub title: &'static str,
    pub url: &'static str,
    pub allowed_networks: Vec<u32>,
}

pub fn registered_dapps() -> Vec<DappGroup> {
    vec![
        DappGroup {
            group_name: "Sample apps",
            dapps: vec![Dapp {
                title: "rLogin Sample App",
                url: "https://basic-sample.rlogin.identity.rifos.org",
                allowed_networks: vec![31],
            }],
        },
        DappGroup {
            group_name: "DeFi",
            dapps: vec![
                Dapp {
                    title: "Sovryn",
                    url: "https://live.sovryn.app",
                    allowed_networks: vec![30],
                },
                Dapp {
                    title: "Money On Chain",
                    url: "https://alpha.moneyonchain.com",
                    allowed_networks: vec![30],
                },
                Dapp {
                    title: "Tropykus",
                    url: "https://app.tropykus.com",
                    allowed_networks: vec![30, 31],
                },
            ],
        },
        DappGroup {
            group_name: "Name services",
            dapps: vec![Dapp {
                title: "RNS Manager",
                url: "https://manager.rns.rifos.org",
                allowed_networks: vec![30, 31],
            }],
        },
    ]
}

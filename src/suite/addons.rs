//! Installed extension CRDs and addon controllers

use super::{CrdCheck, PodCheck, Recorder, SmokeSuite};
use crate::k8s::ClusterApi;
use crate::probe::EndpointProbe;

const CORE_CRDS: [CrdCheck; 6] = [
    CrdCheck {
        crd: "externalsecrets.external-secrets.io",
        display: "External Secrets",
    },
    CrdCheck {
        crd: "clustersecretstores.external-secrets.io",
        display: "ClusterSecretStore",
    },
    CrdCheck {
        crd: "certificates.cert-manager.io",
        display: "Cert Manager Certificates",
    },
    CrdCheck {
        crd: "clusterissuers.cert-manager.io",
        display: "Cert Manager ClusterIssuers",
    },
    CrdCheck {
        crd: "clusterpolicies.kyverno.io",
        display: "Kyverno ClusterPolicies",
    },
    CrdCheck {
        crd: "nodepools.karpenter.sh",
        display: "Karpenter NodePools",
    },
];

const ADDONS: [PodCheck; 7] = [
    PodCheck::required("cert-manager", "app.kubernetes.io/name=cert-manager", "Cert Manager"),
    PodCheck::required(
        "external-secrets",
        "app.kubernetes.io/name=external-secrets",
        "External Secrets Operator",
    ),
    PodCheck::required(
        "kyverno",
        "app.kubernetes.io/component=admission-controller",
        "Kyverno Admission Controller",
    ),
    PodCheck::required(
        "aws-load-balancer",
        "app.kubernetes.io/name=aws-load-balancer-controller",
        "AWS Load Balancer Controller",
    ),
    PodCheck::required("external-dns", "app.kubernetes.io/name=external-dns", "External DNS"),
    PodCheck::required("reloader", "app.kubernetes.io/name=reloader", "Reloader"),
    PodCheck::required("kube-system", "app.kubernetes.io/name=metrics-server", "Metrics Server"),
];

impl<C: ClusterApi, P: EndpointProbe> SmokeSuite<C, P> {
    pub(crate) async fn check_addons(&self, out: &mut Recorder<'_>) {
        out.section("CRDs Installed");
        for check in &CORE_CRDS {
            self.check_crd(out, check).await;
        }

        out.section("Addon Deployments");
        for check in &ADDONS {
            self.check_pods(out, check).await;
        }
    }
}
